//! Chart generation and rendering for the dashboard.
//!
//! This module creates interactive ECharts visualizations for the ledger:
//! - **Budget gauge**: the share of the expense ceiling that has been spent
//! - **Savings goal gauge**: the savings as a share of the savings goal
//! - **Monthly expenses chart**: expense totals per month
//! - **Savings balance chart**: the savings balance at the end of each month
//! - **Expenses by category chart**: expense totals per category
//!
//! Each chart is generated as JSON configuration for the ECharts library and
//! rendered with corresponding HTML containers and JavaScript initialization code.

use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, JsFunction, Tooltip, Trigger,
    },
    series::{Bar, Gauge, GaugeDetail, GaugeProgress, Line},
};
use maud::{Markup, PreEscaped, html};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use time::Date;

use crate::{
    dashboard::{
        Summary,
        aggregation::{
            expenses_by_category, format_month_labels, monthly_expense_totals,
            running_savings_by_month,
        },
    },
    html::HeadElement,
};

const ECHARTS_URL: &str = "https://cdn.jsdelivr.net/npm/echarts@6.0.0/dist/echarts.min.js";

/// A dashboard chart with its HTML container ID and ECharts configuration.
pub(super) struct DashboardChart {
    /// The HTML element ID to use for the chart (kebab-case)
    pub id: &'static str,
    /// The ECharts configuration as a JSON string
    pub options: String,
}

/// Build every dashboard chart for `summary`.
pub(super) fn build_dashboard_charts(summary: &Summary) -> [DashboardChart; 5] {
    [
        DashboardChart {
            id: "budget-gauge",
            options: budget_gauge(summary.percent_spent).to_string(),
        },
        DashboardChart {
            id: "savings-goal-gauge",
            options: savings_goal_gauge(summary.percent_goal_reached).to_string(),
        },
        DashboardChart {
            id: "monthly-expenses-chart",
            options: monthly_expenses_chart(&monthly_expense_totals(&summary.expenses))
                .to_string(),
        },
        DashboardChart {
            id: "savings-balance-chart",
            options: savings_balance_chart(&running_savings_by_month(&summary.savings))
                .to_string(),
        },
        DashboardChart {
            id: "category-chart",
            options: category_chart(&expenses_by_category(&summary.expenses)).to_string(),
        },
    ]
}

/// Renders the HTML containers for dashboard charts.
pub(super) fn charts_view(charts: &[DashboardChart]) -> Markup {
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

/// The ECharts library and the code that draws `charts` once the page has loaded.
///
/// Charts follow the browser's dark mode setting and resize with the window.
pub(super) fn charts_scripts(charts: &[DashboardChart]) -> [HeadElement; 2] {
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

                    const darkModeMediaQuery = window.matchMedia('(prefers-color-scheme: dark)');
                    const updateTheme = () => {{
                        const isDarkMode = darkModeMediaQuery.matches;
                        chart.setTheme(isDarkMode ? 'dark' : 'default');
                    }}
                    darkModeMediaQuery.addEventListener('change', updateTheme);
                    updateTheme();
                }})();"#,
                chart.id, chart.options
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let wrapped_script = format!(
        "document.addEventListener('DOMContentLoaded', function() {{\n{script_content}\n}});"
    );

    [
        HeadElement::ScriptLink(ECHARTS_URL.to_owned()),
        HeadElement::ScriptSource(PreEscaped(wrapped_script)),
    ]
}

/// Charts are drawn with floats, precision past the cent does not matter here.
fn to_chart_value(amount: Decimal) -> f64 {
    amount.round_dp(2).to_f64().unwrap_or_default()
}

fn percentage_gauge(title: &str, name: &str, percentage: Decimal, max: f64) -> Chart {
    Chart::new()
        .title(Title::new().text(title))
        .series(
            Gauge::new()
                .name(name)
                .min(0.0)
                .max(max)
                .progress(GaugeProgress::new().show(true))
                .detail(GaugeDetail::new().value_animation(true).formatter("{value}%"))
                .data(vec![(to_chart_value(percentage.round_dp(1)), name)]),
        )
}

fn budget_gauge(percent_spent: Decimal) -> Chart {
    percentage_gauge("Budget used", "Spent", percent_spent, 100.0)
}

/// Goals can be overshot, so the dial grows to fit the value.
fn savings_goal_gauge(percent_goal_reached: Decimal) -> Chart {
    let value = to_chart_value(percent_goal_reached);
    let max = if value > 100.0 { value.ceil() } else { 100.0 };

    percentage_gauge("Savings goal", "Reached", percent_goal_reached, max)
}

fn month_series(totals: &[(Date, Decimal)]) -> (Vec<String>, Vec<f64>) {
    let months: Vec<Date> = totals.iter().map(|(month, _)| *month).collect();
    let values = totals
        .iter()
        .map(|(_, total)| to_chart_value(*total))
        .collect();

    (format_month_labels(&months), values)
}

fn monthly_expenses_chart(monthly_totals: &[(Date, Decimal)]) -> Chart {
    let (labels, values) = month_series(monthly_totals);

    Chart::new()
        .title(Title::new().text("Monthly expenses"))
        .tooltip(currency_tooltip())
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis())
        .series(Bar::new().name("Expenses").data(values))
}

fn savings_balance_chart(balances: &[(Date, Decimal)]) -> Chart {
    let (labels, values) = month_series(balances);

    Chart::new()
        .title(Title::new().text("Savings"))
        .tooltip(currency_tooltip())
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis())
        .series(Line::new().name("Balance").data(values))
}

fn category_chart(category_totals: &[(String, Decimal)]) -> Chart {
    let labels: Vec<String> = category_totals
        .iter()
        .map(|(category, _)| category.clone())
        .collect();
    let values: Vec<f64> = category_totals
        .iter()
        .map(|(_, total)| to_chart_value(*total))
        .collect();

    Chart::new()
        .title(Title::new().text("Expenses by category"))
        .tooltip(currency_tooltip())
        .grid(default_grid())
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(currency_axis())
        .series(Bar::new().name("Expenses").data(values))
}

fn default_grid() -> Grid {
    Grid::new()
        .left("3%")
        .right("4%")
        .bottom("3%")
        .contain_label(true)
}

fn currency_axis() -> Axis {
    Axis::new()
        .type_(AxisType::Value)
        .axis_label(AxisLabel::new().formatter(currency_formatter()))
}

#[inline]
fn currency_formatter() -> JsFunction {
    JsFunction::new_with_args(
        "number",
        "const currencyFormatter = new Intl.NumberFormat('it-IT', {
              style: 'currency',
              currency: 'EUR'
            });
            return (number) ? currencyFormatter.format(number) : \"-\";",
    )
}

/// Creates a tooltip configuration for currency values
fn currency_tooltip() -> Tooltip {
    Tooltip::new()
        .trigger(Trigger::Axis)
        .value_formatter(currency_formatter())
        .axis_pointer(AxisPointer::new().type_(AxisPointerType::Shadow))
}
