use std::path::Path;
use std::sync::Arc;

use fusionsync_core::api::ResourceApi;
use fusionsync_core::mapping::{MappingTable, Section};
use fusionsync_core::sync::{self, FilledBody, Target, UploadOptions};
use fusionsync_core::{watch, ResourceId, ResourceKind};

use crate::cli::TemplateCommands;
use crate::commands::common::{connect, mapping_table, resource_dir};
use crate::error::CliError;
use crate::output::{print_lines, upload_lines, watch_lines, Line, Tone};

pub async fn run_templates(
    kind: ResourceKind,
    sections: &[Section],
    command: TemplateCommands,
    profile: Option<&str>,
) -> Result<(), CliError> {
    let table = mapping_table(kind, sections)?;

    match command {
        TemplateCommands::Download {
            id,
            output,
            clean,
            remote,
        } => {
            let client = connect(remote, profile)?;
            let root = resource_dir(output, kind);
            run_download(&client, &table, id.into(), &root, clean).await
        }
        TemplateCommands::Upload {
            id,
            input,
            overwrite,
            no_create,
            remote,
        } => {
            let client = connect(remote, profile)?;
            let root = resource_dir(input, kind);
            let options = UploadOptions {
                overwrite,
                create: !no_create,
            };
            run_upload(&client, &table, id.into(), &root, options).await
        }
        TemplateCommands::Watch { input, remote } => {
            let client = connect(remote, profile)?;
            let root = resource_dir(input, kind);
            println!("Watching {} for {} changes", root.display(), kind.label());
            watch::watch(Arc::new(client), table, &root, |report| {
                print_lines(&watch_lines(kind, &report));
            })
            .await?;
            Ok(())
        }
        TemplateCommands::Create { output, locales } => {
            let root = resource_dir(output, kind);
            run_create(&table, &root, &locales).await.map(|_| ())
        }
        TemplateCommands::Duplicate { id, output } => {
            let root = resource_dir(output, kind);
            let copy = sync::duplicate(&root, &id).await?;
            print_lines(&[Line::new(
                Tone::Success,
                format!("Duplicated {} {id} as {copy}", kind.label()),
            )]);
            Ok(())
        }
    }
}

pub async fn run_download<C>(
    client: &C,
    table: &MappingTable,
    target: Target,
    root: &Path,
    clean: bool,
) -> Result<(), CliError>
where
    C: ResourceApi + ?Sized,
{
    let report = sync::download(client, table, target, root, clean).await?;
    print_lines(&[download_summary(table.kind(), report.downloaded.len(), root)]);
    Ok(())
}

pub fn download_summary(kind: ResourceKind, count: usize, root: &Path) -> Line {
    let label = kind.label();
    match count {
        0 => Line::new(Tone::Warning, format!("No {label}s found")),
        1 => Line::new(
            Tone::Success,
            format!("Downloaded 1 {label} to {}", root.display()),
        ),
        n => Line::new(
            Tone::Success,
            format!("Downloaded {n} {label}s to {}", root.display()),
        ),
    }
}

/// Upload and print one line per resource.
///
/// Only a failed single-resource upload is an error; batch failures are
/// reported and the command still succeeds.
pub async fn run_upload<C>(
    client: &C,
    table: &MappingTable,
    target: Target,
    root: &Path,
    options: UploadOptions,
) -> Result<(), CliError>
where
    C: ResourceApi + ?Sized,
{
    let reports = sync::upload(client, table, target, root, options).await?;
    for report in &reports {
        print_lines(&upload_lines(table.kind(), report));
    }

    if let Target::One(id) = target {
        if reports.iter().any(|report| report.outcome.is_failure()) {
            return Err(CliError::UploadFailed(id));
        }
    }
    Ok(())
}

pub async fn run_create(
    table: &MappingTable,
    root: &Path,
    locales: &[String],
) -> Result<ResourceId, CliError> {
    let id = sync::scaffold(table, root, locales).await?;
    print_lines(&[Line::new(
        Tone::Success,
        format!(
            "Created {} {id} in {}",
            table.kind().label(),
            root.join(id.to_string()).display()
        ),
    )]);
    Ok(id)
}

pub async fn run_html_to_text(root: &Path, target: Target) -> Result<Vec<FilledBody>, CliError> {
    let filled = sync::fill_text_bodies(root, target).await?;
    let mut lines: Vec<Line> = filled
        .iter()
        .map(|body| {
            let scope = body
                .locale
                .as_deref()
                .map_or_else(String::new, |locale| format!(" ({locale})"));
            Line::new(
                Tone::Success,
                format!("Rendered {}{scope}", body.path.display()),
            )
        })
        .collect();
    lines.push(if filled.is_empty() {
        Line::new(Tone::Warning, "No empty text bodies to fill")
    } else {
        Line::new(
            Tone::Success,
            format!("Filled {} text bodies in {}", filled.len(), root.display()),
        )
    });
    print_lines(&lines);
    Ok(filled)
}
