pub mod booking;
pub mod consent;
pub mod expense;
pub mod nominee;
pub mod resources;

pub trait ShortName {
    fn short_name(&self) -> &'static str;

    fn short_names_joined(elements: &[impl ShortName]) -> String {
        elements.iter()
            .map(|element| element.short_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
