//! Chart generation and rendering for the monthly summary page.
//!
//! Two ECharts visualizations are built from the aggregated data:
//! - **Monthly chart**: grouped bars of income, expense and balance per month
//! - **Breakdown chart**: a pie of income vs expense for one selected month
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization
//! code.

use charming::{
    Chart,
    component::{Axis, Grid, Legend, Title},
    element::{AxisType, Color, ItemStyle, Tooltip, Trigger},
    series::{Bar, Pie},
};
use maud::{Markup, PreEscaped, html};

use crate::{html::HeadElement, summary::aggregation::MonthlySummary};

const INCOME_COLOR: &str = "#4ade80";
const EXPENSE_COLOR: &str = "#f87171";
const BALANCE_COLOR: &str = "#60a5fa";

/// A summary chart with its HTML container ID and ECharts configuration.
pub(super) struct SummaryChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Renders the HTML containers for the summary charts.
pub(super) fn charts_view(charts: &[SummaryChart]) -> Markup {
    html!(
        section
            id="charts"
            class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @for chart in charts {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }
        }
    )
}

/// Generates JavaScript initialization code for the summary charts.
///
/// Creates scripts that initialize ECharts instances with responsive
/// resizing.
pub(super) fn charts_script(charts: &[SummaryChart]) -> HeadElement {
    let script_content = charts
        .iter()
        .map(|chart| {
            format!(
                r#"(function() {{
                    const chartDom = document.getElementById("{}");
                    const chart = echarts.init(chartDom);
                    const option = {};
                    chart.setOption(option);

                    window.addEventListener('resize', chart.resize);
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{}\n}});",
        script_content
    );

    HeadElement::ScriptSource(PreEscaped(wrapped_script))
}

/// A bar chart of income, expense and balance per month, in the group order
/// of the aggregation.
pub(super) fn monthly_chart(summaries: &[MonthlySummary]) -> Chart {
    let months: Vec<String> = summaries
        .iter()
        .map(|summary| summary.month.clone())
        .collect();
    let incomes: Vec<f64> = summaries.iter().map(|summary| summary.income).collect();
    let expenses: Vec<f64> = summaries.iter().map(|summary| summary.expense).collect();
    let balances: Vec<f64> = summaries.iter().map(|summary| summary.balance).collect();

    Chart::new()
        .title(Title::new().text("Monthly income and expenses"))
        .tooltip(Tooltip::new().trigger(Trigger::Axis))
        .legend(Legend::new().top("bottom"))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("10%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(months))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(
            Bar::new()
                .name("Income")
                .item_style(ItemStyle::new().color(INCOME_COLOR))
                .data(incomes),
        )
        .series(
            Bar::new()
                .name("Expense")
                .item_style(ItemStyle::new().color(EXPENSE_COLOR))
                .data(expenses),
        )
        .series(
            Bar::new()
                .name("Balance")
                .item_style(ItemStyle::new().color(BALANCE_COLOR))
                .data(balances),
        )
}

/// A pie chart of income vs expense for the selected month.
pub(super) fn breakdown_chart(month: &str, income: f64, expense: f64) -> Chart {
    Chart::new()
        .title(Title::new().text(format!("Breakdown for {month}")))
        .tooltip(Tooltip::new().trigger(Trigger::Item))
        .legend(Legend::new().top("bottom"))
        .color(vec![Color::from(INCOME_COLOR), Color::from(EXPENSE_COLOR)])
        .series(
            Pie::new()
                .name(month.to_owned())
                .radius("55%")
                .data(vec![(income, "Income"), (expense, "Expense")]),
        )
}
