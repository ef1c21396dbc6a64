//! The monthly summary page.
//!
//! The page receives the ledger's transaction snapshot as URL-encoded JSON
//! query data and recomputes its aggregates independently. When the snapshot
//! is missing or unparseable it falls back to the session user's stored
//! transactions instead of propagating the corrupt value.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    backup::TransactionRecord,
    endpoints,
    html::{HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    summary::{
        aggregation::{MonthlySummary, month_breakdown, monthly_summary},
        charts::{SummaryChart, breakdown_chart, charts_script, charts_view, monthly_chart},
    },
    transaction::get_transactions,
    user::UserId,
};

const ECHARTS_CDN: &str = "https://cdn.jsdelivr.net/npm/echarts@5.5.1/dist/echarts.min.js";

/// The state needed for the summary page.
#[derive(Clone)]
pub struct SummaryState {
    /// The database connection used for the snapshot fallback.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters of the summary page.
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// The URL-encoded JSON transaction snapshot from the ledger page.
    pub data: Option<String>,
    /// The month selected for the pie chart, e.g. "2025-04".
    pub month: Option<String>,
}

/// Resolve the transaction records to aggregate: the query snapshot when it
/// parses, otherwise the user's stored transactions.
fn resolve_records(
    query_data: Option<&str>,
    user_id: UserId,
    db_connection: &Mutex<Connection>,
) -> Result<Vec<TransactionRecord>, Error> {
    if let Some(data) = query_data {
        match serde_json::from_str::<Vec<TransactionRecord>>(data) {
            Ok(records) => return Ok(records),
            Err(error) => {
                tracing::warn!("Could not parse summary snapshot, falling back to store: {error}");
            }
        }
    }

    let connection = db_connection.lock().map_err(|_| Error::DatabaseLockError)?;
    let transactions = get_transactions(user_id, &connection)?;

    Ok(transactions.iter().map(TransactionRecord::from).collect())
}

fn month_selector(summaries: &[MonthlySummary], selected_month: &str, data: Option<&str>) -> Markup {
    html! {
        form method="get" action=(endpoints::SUMMARY_VIEW) class="mt-8 text-center"
        {
            @if let Some(data) = data
            {
                input type="hidden" name="data" value=(data);
            }

            label for="month" class="mr-2" { "Select month:" }

            select
                name="month"
                id="month"
                onchange="this.form.submit()"
                class="border rounded px-2 py-1 text-gray-900"
            {
                @for summary in summaries
                {
                    option value=(summary.month) selected[summary.month == selected_month]
                    {
                        (summary.month)
                    }
                }
            }
        }
    }
}

/// Display the monthly summary page.
pub async fn get_summary_page(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserId>,
    Query(query): Query<SummaryQuery>,
) -> Response {
    let records = match resolve_records(query.data.as_deref(), user_id, &state.db_connection) {
        Ok(records) => records,
        Err(error) => return error.into_response(),
    };

    let summaries = monthly_summary(&records);

    // The first month seen is selected when the query gives none.
    let selected_month = query
        .month
        .filter(|month| summaries.iter().any(|summary| &summary.month == month))
        .or_else(|| summaries.first().map(|summary| summary.month.clone()));

    let mut charts = vec![SummaryChart {
        id: "monthly-chart",
        options: monthly_chart(&summaries).to_string(),
    }];

    if let Some(selected_month) = &selected_month {
        let (income, expense) = month_breakdown(&records, selected_month);
        charts.push(SummaryChart {
            id: "breakdown-chart",
            options: breakdown_chart(selected_month, income, expense).to_string(),
        });
    }

    let content = html! {
        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-4"
            {
                a href=(endpoints::ROOT) class=(LINK_STYLE) { "← Back" }

                h2 class="text-2xl font-bold text-center mb-6" { "Monthly Summary" }

                @if summaries.is_empty()
                {
                    p class="text-center text-gray-500 dark:text-gray-400"
                    {
                        "No transactions to summarize."
                    }
                }
                @else
                {
                    (charts_view(&charts))

                    @if let Some(selected_month) = &selected_month
                    {
                        (month_selector(&summaries, selected_month, query.data.as_deref()))
                    }
                }
            }
        }
    };

    let head_elements = [
        HeadElement::ScriptLink(ECHARTS_CDN.to_owned()),
        charts_script(&charts),
    ];

    base("Monthly Summary", &head_elements, &content).into_response()
}
