use reqwest::Url;

pub fn fetch_nominees(base_url: Url) -> Url {
    join(base_url, "fetch_nominees.php")
}

pub fn approve_nominee(base_url: Url) -> Url {
    join(base_url, "approve_nominee.php")
}

pub fn reject_nominee(base_url: Url) -> Url {
    join(base_url, "reject_nominee.php")
}

pub fn disqualify_nominee(base_url: Url) -> Url {
    join(base_url, "disqualify_nominee.php")
}

pub fn fetch_bookings(base_url: Url) -> Url {
    join(base_url, "fetch_bookings.php")
}

pub fn confirm_booking(base_url: Url) -> Url {
    join(base_url, "confirm_booking.php")
}

pub fn cancel_booking(base_url: Url) -> Url {
    join(base_url, "cancel_booking.php")
}

pub fn fetch_consent_forms(base_url: Url) -> Url {
    join(base_url, "fetch_consent_forms.php")
}

pub fn upload_consent_scan(base_url: Url) -> Url {
    join(base_url, "upload_consent_scan.php")
}

pub fn fetch_expenses(base_url: Url) -> Url {
    join(base_url, "fetch_expenses.php")
}

pub fn approve_expense(base_url: Url) -> Url {
    join(base_url, "approve_expense.php")
}

pub fn reject_expense(base_url: Url) -> Url {
    join(base_url, "reject_expense.php")
}

fn join(mut base_url: Url, path: &str) -> Url {
    base_url.path_segments_mut()
        .map(|mut path_segments| {
            path_segments
                .pop_if_empty()
                .push(path);
        })
        .unwrap_or_else(|_| panic!("Base URL '{}' is not valid. It must be a fully qualified URL, like 'https://example.com:1234/a/b'.", base_url.clone()));
    base_url
}


#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[test]
    fn should_join_without_trailing_slash() -> anyhow::Result<()> {

        let url = Url::parse("https://localhost:1234/api")?;

        let result = join(url, "fetch_nominees.php");
        assert_that!(result.as_str(), eq("https://localhost:1234/api/fetch_nominees.php"));

        Ok(())
    }

    #[test]
    fn should_join_with_trailing_slash() -> anyhow::Result<()> {

        let url = Url::parse("https://localhost:1234/api/")?;

        let result = join(url, "fetch_nominees.php");
        assert_that!(result.as_str(), eq("https://localhost:1234/api/fetch_nominees.php"));

        Ok(())
    }

    #[test]
    fn should_build_a_mutation_route() -> anyhow::Result<()> {

        let url = Url::parse("https://ward.example.org/api")?;

        let result = reject_nominee(url);
        assert_that!(result.as_str(), eq("https://ward.example.org/api/reject_nominee.php"));

        Ok(())
    }
}
