//! `search` handler: drives one picker search from the command line.
//!
//! Builds the same [`RemoteSelect`] the console pickers use, issues a
//! single query through the console's search function and prints the
//! options the picker would offer, create entry included.

use serde::Serialize;
use tabled::Tabled;
use tracing::debug;

use wayfare_core::{Console, ListParams, RemoteSelect, Resource, SelectOption, SelectProps, SelectValue};

use crate::cli::{GlobalOpts, SearchArgs};
use crate::error::CliError;
use crate::output;

use super::util;

/// One option as printed. Created options have no server id yet.
#[derive(Debug, Serialize)]
pub(crate) struct OptionView {
    id: Option<String>,
    label: String,
    created: bool,
}

#[derive(Tabled)]
struct OptionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Option")]
    label: String,
}

impl<T: Resource> From<&SelectOption<T>> for OptionView {
    fn from(option: &SelectOption<T>) -> Self {
        Self {
            id: (!option.is_created()).then(|| option.id().to_string()),
            label: option.label(),
            created: option.is_created(),
        }
    }
}

/// Run the query through a fresh picker and return what it would show.
pub(crate) async fn pick_options<T: Resource>(
    console: &Console,
    args: &SearchArgs,
) -> Result<Vec<OptionView>, CliError> {
    let base: ListParams = args.params.iter().cloned().collect();
    let mut props = SelectProps::new(T::KIND.key(), console.searcher::<T>(base));
    if args.creatable {
        props = props.creatable();
    }

    let mut select = RemoteSelect::new(props, SelectValue::empty(false));
    select.focus();
    let request = select.query(args.query.as_str());
    let response = request.run().await;
    let applied = select.resolve(response)?;
    debug!(applied, results = select.results().len(), "search resolved");

    Ok(select.visible_options().iter().map(OptionView::from).collect())
}

pub async fn handle<T: Resource>(
    console: &Console,
    args: &SearchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let spinner = util::spinner(&format!("Searching {}", T::KIND.label()), global);
    let options = pick_options::<T>(console, args).await;
    spinner.finish_and_clear();
    let options = options?;

    let color = output::should_color(global.color);
    let out = output::render_list(
        global.output,
        &options,
        |o| OptionRow {
            id: o
                .id
                .clone()
                .unwrap_or_else(|| output::muted("(new)", color)),
            label: o.label.clone(),
        },
        |o| o.id.clone().unwrap_or_else(|| o.label.clone()),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
