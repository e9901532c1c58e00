/// Marker starting every progress line we ask the extractor to print
pub const PROGRESS_MARKER: &str = "[bcdl]";

/// The `--progress-template` matching [`RawProgress::from_line`]
pub const PROGRESS_TEMPLATE: &str = concat!(
    "download:[bcdl]",
    " %(progress.status)s",
    " %(progress.downloaded_bytes)s",
    " %(progress.total_bytes)s",
    " %(progress.total_bytes_estimate)s",
    " %(progress.fragment_index)s",
    " %(progress.fragment_count)s",
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Other,
}

/// Counters reported by the extractor while downloading.
///
/// Any of them may be missing, and fragment based estimates
/// are not guaranteed to increase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawProgress {
    pub status: ProgressStatus,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub total_bytes_estimate: Option<f64>,
    pub fragment_index: Option<u64>,
    pub fragment_count: Option<u64>,
}

/// A normalized progress percentage, between 0 and 100
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percent: u8,
}

impl RawProgress {
    #[cfg(test)]
    pub fn downloading() -> Self {
        Self {
            status: ProgressStatus::Downloading,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
            fragment_index: None,
            fragment_count: None,
        }
    }

    #[cfg(test)]
    pub fn finished() -> Self {
        Self {
            status: ProgressStatus::Finished,
            ..Self::downloading()
        }
    }

    /// Parse a line printed with [`PROGRESS_TEMPLATE`].
    /// Return None for any other line.
    pub fn from_line(line: &str) -> Option<Self> {
        let mut fields = line.trim().strip_prefix(PROGRESS_MARKER)?.split_whitespace();

        let status = match fields.next()? {
            "downloading" => ProgressStatus::Downloading,
            "finished" => ProgressStatus::Finished,
            _ => ProgressStatus::Other,
        };

        // Missing values are printed as "NA"
        let mut next = || fields.next().and_then(|s| s.parse::<f64>().ok());
        let as_count = |v: Option<f64>| v.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64);

        Some(Self {
            status,
            downloaded_bytes: as_count(next()),
            total_bytes: as_count(next()),
            total_bytes_estimate: next(),
            fragment_index: as_count(next()),
            fragment_count: as_count(next()),
        })
    }

    /// Normalize the counters into a percentage.
    ///
    /// Sources are used in order: known total, positive estimate,
    /// fragment position, and 0 if none is available.
    /// A finished download is always at 100.
    /// Return None for statuses that carry no progress.
    pub fn to_event(&self) -> Option<ProgressEvent> {
        let percent = match self.status {
            ProgressStatus::Finished => 100.0,
            ProgressStatus::Other => return None,
            ProgressStatus::Downloading => {
                let downloaded = self.downloaded_bytes.unwrap_or(0) as f64;

                if let Some(total) = self.total_bytes.filter(|&t| t > 0) {
                    downloaded / total as f64 * 100.0
                } else if let Some(estimate) = self.total_bytes_estimate.filter(|&e| e > 0.0) {
                    downloaded / estimate * 100.0
                } else if let (Some(index), Some(count)) =
                    (self.fragment_index, self.fragment_count.filter(|&c| c > 0))
                {
                    index as f64 / count as f64 * 100.0
                } else {
                    0.0
                }
            }
        };

        Some(ProgressEvent {
            percent: percent.clamp(0.0, 100.0) as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percent(raw: RawProgress) -> Option<u8> {
        raw.to_event().map(|e| e.percent)
    }

    #[test]
    fn known_total_comes_first() {
        let raw = RawProgress {
            downloaded_bytes: Some(50),
            total_bytes: Some(200),
            total_bytes_estimate: Some(100.0),
            fragment_index: Some(9),
            fragment_count: Some(10),
            ..RawProgress::downloading()
        };
        assert_eq!(percent(raw), Some(25));
    }

    #[test]
    fn estimate_is_used_only_when_positive() {
        let raw = RawProgress {
            downloaded_bytes: Some(30),
            total_bytes_estimate: Some(60.0),
            ..RawProgress::downloading()
        };
        assert_eq!(percent(raw), Some(50));

        let raw = RawProgress {
            downloaded_bytes: Some(30),
            total_bytes_estimate: Some(0.0),
            fragment_index: Some(3),
            fragment_count: Some(4),
            ..RawProgress::downloading()
        };
        assert_eq!(percent(raw), Some(75));
    }

    #[test]
    fn nothing_known_is_zero() {
        assert_eq!(percent(RawProgress::downloading()), Some(0));

        let raw = RawProgress {
            fragment_index: Some(3),
            fragment_count: Some(0),
            ..RawProgress::downloading()
        };
        assert_eq!(percent(raw), Some(0));
    }

    #[test]
    fn overshooting_estimates_are_clamped() {
        let raw = RawProgress {
            downloaded_bytes: Some(150),
            total_bytes_estimate: Some(100.0),
            ..RawProgress::downloading()
        };
        assert_eq!(percent(raw), Some(100));
    }

    #[test]
    fn finished_forces_100() {
        let raw = RawProgress {
            downloaded_bytes: Some(1),
            total_bytes: Some(1000),
            ..RawProgress::finished()
        };
        assert_eq!(percent(raw), Some(100));
    }

    #[test]
    fn parses_template_lines() {
        let raw = RawProgress::from_line("[bcdl] downloading 1024 NA 4096.0 NA NA").unwrap();
        assert_eq!(raw.status, ProgressStatus::Downloading);
        assert_eq!(raw.downloaded_bytes, Some(1024));
        assert_eq!(raw.total_bytes, None);
        assert_eq!(raw.total_bytes_estimate, Some(4096.0));
        assert_eq!(percent(raw), Some(25));

        let raw = RawProgress::from_line("[bcdl] finished 10 10 NA NA NA").unwrap();
        assert_eq!(raw.status, ProgressStatus::Finished);
    }

    #[test]
    fn other_lines_are_ignored() {
        assert_eq!(RawProgress::from_line("[download] Destination: a.mp4"), None);
        assert_eq!(RawProgress::from_line(""), None);
        assert_eq!(
            RawProgress::from_line("[bcdl] error NA NA NA NA NA").and_then(|r| r.to_event()),
            None
        );
    }
}
