//! Plan check: every declaration validated, natural keys unique.

use decort_core::{PlannedResource, Provider};

use super::util::read_json;
use crate::cli::{GlobalOpts, PlanArgs};
use crate::error::CliError;
use crate::output;

pub fn handle(provider: &Provider, args: &PlanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let planned: Vec<PlannedResource> = read_json(&args.plan)?;
    tracing::debug!(count = planned.len(), "checking plan");
    provider.check_plan(&planned)?;
    output::print_status(&output::success(
        &format!("{} resources checked", planned.len()),
        global.color,
    ));
    Ok(())
}
