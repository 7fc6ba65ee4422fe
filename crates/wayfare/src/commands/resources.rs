//! `list` and `get` handlers, generic over every resource.

use std::sync::Arc;

use tabled::Tabled;

use wayfare_core::{Console, EntityId, ListParams, Resource};

use crate::cli::{GetArgs, GlobalOpts, ListArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Row type ────────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct Row {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl<T: Resource> From<&Arc<T>> for Row {
    fn from(item: &Arc<T>) -> Self {
        Self {
            id: item.id().to_string(),
            name: item.label(),
        }
    }
}

/// Query parameters from `--search` and repeated `--param` flags.
pub(crate) fn list_params(args: &ListArgs) -> ListParams {
    let params: ListParams = args.params.iter().cloned().collect();
    match args.search {
        Some(ref text) => params.search(text),
        None => params,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle_list<T: Resource>(
    console: &Console,
    args: &ListArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = util::spinner(&format!("Fetching {}", T::KIND.label()), global);
    let fetched = console.fetch_list::<T>(list_params(args)).await;
    spinner.finish_and_clear();
    fetched?;

    // Render from the store, so rows follow collection order.
    let state = console.state();
    let sel = wayfare_core::selectors::<T>(&state);
    let limit = args.limit.unwrap_or(usize::MAX);
    let mut items: Vec<Arc<T>> = sel.items();
    items.truncate(limit);

    let out = output::render_list(global.output, &items, |i| Row::from(i), |i| i.id().to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn handle_get<T: Resource>(
    console: &Console,
    args: &GetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id: EntityId = util::parse_id(&args.id)?;
    let item = console.fetch_item::<T>(&id).await?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &item,
        |i| util::detail(i, color),
        |i| i.id().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
