use libcodeledger_core::{
    export::{export_json, SessionExport},
    render_report, LayoutEngine, LedgerError, MarkdownEngine, PdfEngine,
};
use serde::Serialize;
use tracing::info;
use crate::cli::{Cli, ReportFormat};
use crate::output::{output_success, Human};
use crate::session::Session;

#[derive(Serialize)]
struct ReportOutput {
    name: String,
    file_name: String,
    mime_type: String,
    size_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_link: Option<String>,
}

impl Human for ReportOutput {
    fn human(&self) -> String {
        match (&self.output_path, &self.data_link) {
            (Some(path), _) => format!("Wrote {} ({} bytes)", path, self.size_bytes),
            (None, Some(link)) => format!("{}\n{}", self.file_name, link),
            (None, None) => self.file_name.clone(),
        }
    }
}

impl Human for SessionExport {
    fn human(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

pub fn run_report(
    session: &Session,
    cli: &Cli,
    file: Option<String>,
    format: ReportFormat,
    link: bool,
) -> Result<(), LedgerError> {
    let name = session.target(file.as_deref())?;
    let record = session.store.get(&name)?;

    let report_config = &session.config.report;
    let engine: Box<dyn LayoutEngine> = match format {
        ReportFormat::Pdf => Box::new(PdfEngine::new(report_config.margin)),
        ReportFormat::Md => Box::new(MarkdownEngine),
    };
    let report = render_report(record, engine.as_ref(), report_config)?;

    let (output_path, data_link) = if link {
        (None, Some(report.data_link()))
    } else {
        std::fs::create_dir_all(&session.out_dir)?;
        let path = session.out_dir.join(&report.file_name);
        std::fs::write(&path, &report.bytes)?;
        info!(path = %path.display(), "report written");
        (Some(path.to_string_lossy().to_string()), None)
    };

    output_success(cli, ReportOutput {
        name,
        file_name: report.file_name,
        mime_type: report.mime_type.to_string(),
        size_bytes: report.bytes.len(),
        output_path,
        data_link,
    });
    Ok(())
}

pub fn run_export(session: &Session, cli: &Cli) {
    output_success(cli, export_json(&session.store));
}
