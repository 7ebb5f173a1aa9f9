use chrono::Utc;

use crate::{
    admin::{costs_start_time, CostsBucket, OpenAiAdmin, COSTS_PAGE_LIMIT},
    cli::CostsArgs,
    config::Config,
    errors::GptError,
    output::{self, separator_line},
    validation,
};

pub fn costs(args: &CostsArgs, config: &Config) -> Result<(), GptError> {
    let days = validation::days(args.days.as_deref())?;
    let api = OpenAiAdmin::new(config)?;

    let start_time = costs_start_time(Utc::now().timestamp(), days);
    tracing::debug!(start_time, days, "querying costs");
    let costs = api.get_costs(start_time, COSTS_PAGE_LIMIT)?;

    if args.json {
        println!("{}", costs.raw);
        return Ok(());
    }

    let mut buckets = costs.value.data;
    buckets.sort_by_key(|bucket| bucket.start_time);
    print!("{}", costs_report(&buckets, days));
    Ok(())
}

fn costs_report(buckets: &[CostsBucket], days: i64) -> String {
    let sep = separator_line();
    let billed: Vec<(&CostsBucket, f64, &str)> = buckets
        .iter()
        .filter_map(|b| b.cost().map(|(cost, org)| (b, cost, org)))
        .collect();
    let total: f64 = billed.iter().map(|(_, cost, _)| cost).sum();

    let mut report = format!(
        "{sep}\nOverall usage (in USD) over {} days: {}\n{sep}\n",
        days, total
    );
    report.push_str(&format!(
        "{:<25}{:<25}{:<25}{}\n{sep}\n",
        "Start time", "End time", "Usage (USD)", "Organization ID"
    ));
    for (bucket, cost, org) in billed {
        report.push_str(&format!(
            "{:<25}{:<25}{:<25}{}\n",
            output::datetime(bucket.start_time),
            output::datetime(bucket.end_time),
            cost,
            org
        ));
    }
    report.push_str(&sep);
    report.push('\n');
    report
}
