use crate::series::error::SeriesError;
use crate::spi::error::FitError;
use crate::types::month::Month;
use crate::types::window::WindowLength;
use std::fmt;

/// Something that went wrong for one station without stopping the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub station_code: String,
    /// `None` when the failure happened before the windows were split out.
    pub window: Option<WindowLength>,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// Calendar completion, interpolation or rolling failed. The station is missing
    /// from every table, or from the window's table when `window` is set.
    StageFailed(SeriesError),
    /// No gamma distribution could be fitted. The station is missing from the window's table.
    DegenerateFit(FitError),
    /// A cumulative probability was moved into `[ε, 1 - ε]`. The SPI value is still emitted.
    ProbabilityClamped { month: Month, probability: f64 },
}

impl Diagnostic {
    pub(crate) fn new(
        station_code: impl Into<String>,
        window: Option<WindowLength>,
        kind: DiagnosticKind,
    ) -> Self {
        Self {
            station_code: station_code.into(),
            window,
            kind,
        }
    }

    /// Whether the station was left out of at least one table because of this entry.
    pub fn omits_station(&self) -> bool {
        !matches!(self.kind, DiagnosticKind::ProbabilityClamped { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station {}", self.station_code)?;
        if let Some(window) = self.window {
            write!(f, " (window {})", window)?;
        }
        match &self.kind {
            DiagnosticKind::StageFailed(e) => write!(f, ": {}", e),
            DiagnosticKind::DegenerateFit(e) => write!(f, ": cannot fit gamma distribution: {}", e),
            DiagnosticKind::ProbabilityClamped { month, probability } => {
                write!(f, ": probability {:e} at {} was clamped", probability, month)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_station_and_window() {
        let diagnostic = Diagnostic::new(
            "C",
            WindowLength::new(3),
            DiagnosticKind::DegenerateFit(FitError::Empty),
        );
        let text = diagnostic.to_string();
        assert!(text.starts_with("Station C (window 3m): cannot fit"), "{}", text);
        assert!(diagnostic.omits_station());
    }

    #[test]
    fn clamps_do_not_omit() {
        let diagnostic = Diagnostic::new(
            "A",
            WindowLength::new(1),
            DiagnosticKind::ProbabilityClamped {
                month: Month::new(5, 2001),
                probability: 1.0,
            },
        );
        assert!(!diagnostic.omits_station());
        assert!(diagnostic.to_string().contains("2001-05"));
    }
}
