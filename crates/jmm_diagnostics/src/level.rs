//! DiagnosticLevel - 诊断级别

use ariadne::ReportKind;
use colored::*;
use std::fmt;

/// 诊断级别
///
/// 只有 `Error` 会让驱动层跳过后续阶段，其余级别仅做提示。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
    Note,
}

impl DiagnosticLevel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Note => "note",
        }
    }

    /// 终端输出用的着色名称
    pub fn colored_name(&self) -> ColoredString {
        match self {
            Self::Error => self.name().red().bold(),
            Self::Warning => self.name().yellow().bold(),
            Self::Info => self.name().blue().bold(),
            Self::Note => self.name().bright_black().bold(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// 对应的 ariadne 报告类型
    pub(crate) fn report_kind(&self) -> ReportKind<'static> {
        match self {
            Self::Error => ReportKind::Error,
            Self::Warning => ReportKind::Warning,
            Self::Info | Self::Note => ReportKind::Advice,
        }
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_error_blocks() {
        assert!(DiagnosticLevel::Error.is_error());
        assert!(!DiagnosticLevel::Warning.is_error());
        assert!(!DiagnosticLevel::Note.is_error());
    }

    #[test]
    fn test_errors_sort_first() {
        let mut levels = vec![
            DiagnosticLevel::Note,
            DiagnosticLevel::Error,
            DiagnosticLevel::Warning,
        ];
        levels.sort();
        assert_eq!(levels[0], DiagnosticLevel::Error);
        assert_eq!(format!("{}", levels[1]), "warning");
    }
}
