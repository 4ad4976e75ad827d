//! apply / read / destroy / data: one provider callback per invocation.

use decort_core::{AttrMap, Operation, Provider, ResourceData};

use super::util::{StateFile, emit_state, read_json, read_state};
use crate::cli::{ApplyArgs, DataArgs, DestroyArgs, GlobalOpts, StateArgs};
use crate::error::CliError;
use crate::output;

pub async fn apply(provider: &Provider, args: &ApplyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let declared: AttrMap = read_json(&args.declared)?;
    let prior = match &args.state {
        Some(path) => {
            let state = read_state(path, &args.type_name)?;
            state.id.map(|id| (id, state.attributes))
        }
        None => None,
    };

    let (action, d) = provider.apply(&args.type_name, prior, declared).await?;
    let state = StateFile::capture(&args.type_name, &d);
    output::print_status(&output::success(
        &format!(
            "{action} {} {}",
            args.type_name,
            state.id.as_deref().unwrap_or("(no id)")
        ),
        global.color,
    ));
    emit_state(&state, args.out.as_deref(), global.output)
}

pub async fn read(provider: &Provider, args: &StateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let state = read_state(&args.state, &args.type_name)?;
    let Some(id) = state.id else {
        return Err(CliError::Validation {
            message: format!("{} has no id to read", args.state.display()),
        });
    };

    let mut d = ResourceData::from_state(id, state.attributes);
    provider
        .invoke(&args.type_name, Operation::Read, &mut d)
        .await?;
    if d.id().is_none() {
        output::print_status(&format!(
            "{} no longer exists on the platform; apply will re-create it",
            args.type_name
        ));
    }
    emit_state(
        &StateFile::capture(&args.type_name, &d),
        args.out.as_deref(),
        global.output,
    )
}

pub async fn destroy(
    provider: &Provider,
    args: &DestroyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = read_state(&args.state, &args.type_name)?;
    let Some(id) = state.id else {
        output::print_status(&format!("{} has no id, nothing to destroy", args.state.display()));
        return Ok(());
    };

    let mut d = ResourceData::from_state(id.clone(), state.attributes);
    provider
        .invoke(&args.type_name, Operation::Delete, &mut d)
        .await?;
    output::print_status(&output::success(
        &format!("destroyed {} {id}", args.type_name),
        global.color,
    ));
    Ok(())
}

pub async fn data(provider: &Provider, args: &DataArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let declared: AttrMap = read_json(&args.declared)?;
    let d = provider.read_data_source(&args.type_name, declared).await?;
    emit_state(&StateFile::capture(&args.type_name, &d), None, global.output)
}
