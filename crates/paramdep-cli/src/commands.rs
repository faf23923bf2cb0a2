use std::time::Instant;

use anyhow::{Context, Result};
use paramdep_xml::{Document, ReadOptions, read_file, to_string, write_file};
use tracing::{info, info_span, warn};

use paramdep_cli::report::{apply_assignments, dependency_rows, entry_statuses};

use crate::cli::{CheckArgs, DocumentArgs, InspectArgs, NormalizeArgs};
use crate::summary::{print_dependencies, print_entries, print_skipped};

fn load(args: &DocumentArgs) -> Result<Document> {
    let options = if args.skip_invalid {
        ReadOptions::skip_failures()
    } else {
        ReadOptions::default()
    };
    let start = Instant::now();
    let document = read_file(&args.file, &options)
        .with_context(|| format!("read {}", args.file.display()))?;
    info!(
        path = %args.file.display(),
        entries = document.list.len(),
        dependencies = document.sheet.len(),
        skipped = document.skipped.len(),
        duration_ms = start.elapsed().as_millis(),
        "document loaded"
    );
    Ok(document)
}

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let span = info_span!("inspect", path = %args.document.file.display());
    let _guard = span.enter();
    let document = load(&args.document)?;
    let rows = dependency_rows(&document.list, &document.sheet);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!(
            "{} ({} entries), {}",
            document.list.name(),
            document.list.len(),
            document.sheet.name()
        );
        print_dependencies(&rows);
        print_skipped(&document.skipped);
    }
    Ok(())
}

/// Returns whether every visible entry passes its checks.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    let span = info_span!("check", path = %args.document.file.display());
    let _guard = span.enter();
    let Document {
        mut list,
        sheet,
        skipped,
    } = load(&args.document)?;
    apply_assignments(&mut list, &args.set)?;
    sheet
        .check_types(&list)
        .context("dependencies do not match entry types")?;
    let statuses = entry_statuses(&list, &sheet)?;
    let failing: Vec<&str> = statuses
        .iter()
        .filter(|status| status.visible && !status.valid)
        .map(|status| status.name.as_str())
        .collect();
    for name in &failing {
        warn!(entry = %name, "entry fails its checks");
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else {
        print_entries(&statuses);
        print_skipped(&skipped);
    }
    Ok(failing.is_empty())
}

pub fn run_normalize(args: &NormalizeArgs) -> Result<()> {
    let span = info_span!("normalize", path = %args.document.file.display());
    let _guard = span.enter();
    let document = load(&args.document)?;
    for skipped in &document.skipped {
        warn!(index = skipped.index, error = %skipped.error, "dropped from output");
    }
    match &args.output {
        Some(path) => {
            write_file(path, &document.list, &document.sheet)
                .with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "document written");
        }
        None => println!("{}", to_string(&document.list, &document.sheet)?),
    }
    Ok(())
}
