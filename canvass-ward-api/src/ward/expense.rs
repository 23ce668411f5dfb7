use std::sync::Arc;

use serde::Serialize;

use canvass_types::expense::{Expense, ExpenseId};
use canvass_types::nominee::RejectionReason;

use crate::ward::{routes, ClientError, WardConnection};

#[derive(thiserror::Error, Debug)]
#[error("Could not list expenses:\n  {message}")]
pub struct ListExpensesError {
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Expense <{expense_id}> could not be approved:\n  {message}")]
pub struct ApproveExpenseError {
    pub expense_id: ExpenseId,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Expense <{expense_id}> could not be rejected:\n  {message}")]
pub struct RejectExpenseError {
    pub expense_id: ExpenseId,
    pub message: String,
}

pub struct Expenses {
    connection: Arc<WardConnection>,
}

impl Expenses {

    pub(super) fn new(connection: Arc<WardConnection>) -> Self {
        Self { connection }
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn list(&self) -> Result<Vec<Expense>, ClientError<ListExpensesError>> {

        let url = routes::fetch_expenses(self.connection.base_url());

        let payload = self.connection.get(url).await
            .map_err(|cause| cause.into_client_error(|message| ListExpensesError { message }))?;

        serde_json::from_value::<Vec<Expense>>(payload)
            .map_err(|cause| ClientError::InvalidResponse(format!("Failed to parse expense rows:\n  {cause}")))
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn approve(&self, expense_id: ExpenseId) -> Result<(), ClientError<ApproveExpenseError>> {

        let url = routes::approve_expense(self.connection.base_url());

        let body = {
            #[derive(Serialize, Debug)]
            struct ApproveExpense {
                id: ExpenseId,
            }

            ApproveExpense {
                id: expense_id,
            }
        };

        self.connection.post_json(url, &body).await
            .map_err(|cause| cause.into_client_error(|message| ApproveExpenseError { expense_id, message }))?;

        Ok(())
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn reject(&self, expense_id: ExpenseId, reason: RejectionReason) -> Result<(), ClientError<RejectExpenseError>> {

        let url = routes::reject_expense(self.connection.base_url());

        let body = {
            #[derive(Serialize, Debug)]
            struct RejectExpense {
                id: ExpenseId,
                reason: RejectionReason,
            }

            RejectExpense {
                id: expense_id,
                reason,
            }
        };

        self.connection.post_json(url, &body).await
            .map_err(|cause| cause.into_client_error(|message| RejectExpenseError { expense_id, message }))?;

        Ok(())
    }
}
