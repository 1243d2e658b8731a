//! Report export port trait.

use crate::domain::analysis::AnalysisReport;
use crate::domain::error::PortmetricsError;
use crate::domain::universe::FetchReport;
use std::path::Path;

/// Port for writing analysis results for reporting collaborators.
pub trait ReportPort {
    fn write(
        &self,
        report: &AnalysisReport,
        fetch: Option<&FetchReport>,
        output: &Path,
    ) -> Result<(), PortmetricsError>;
}
