//! Fixed-size sliding windows over whitespace-separated words.

use crate::error::RagError;

/// Sliding-window tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowConfig {
    chunk_size: usize,
    overlap_ratio: f64,
    min_chars: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            overlap_ratio: 0.2,
            min_chars: 200,
        }
    }
}

impl WindowConfig {
    /// Validates and builds a window configuration.
    ///
    /// `chunk_size` must be positive and `overlap_ratio` must lie in `[0, 1)`.
    pub fn new(chunk_size: usize, overlap_ratio: f64, min_chars: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::InvalidWindow("chunk_size must be positive".into()));
        }
        if !(0.0..1.0).contains(&overlap_ratio) {
            return Err(RagError::InvalidWindow(format!(
                "overlap_ratio {overlap_ratio} must be in [0, 1)"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap_ratio,
            min_chars,
        })
    }

    /// Words per window.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fraction of each window shared with the next.
    pub fn overlap_ratio(&self) -> f64 {
        self.overlap_ratio
    }

    /// Windows whose body has at most this many characters are dropped.
    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    /// Words the window advances by; never zero.
    pub fn step(&self) -> usize {
        let step = (self.chunk_size as f64 * (1.0 - self.overlap_ratio)).round() as usize;
        step.max(1)
    }

    /// Start offsets of every window over `word_count` words.
    pub fn window_starts(&self, word_count: usize) -> impl Iterator<Item = usize> {
        (0..word_count).step_by(self.step())
    }

    /// Splits `text` into window bodies, dropping those at or below `min_chars`.
    pub fn windows(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        self.window_starts(words.len())
            .map(|start| {
                let end = (start + self.chunk_size).min(words.len());
                words[start..end].join(" ")
            })
            .filter(|body| body.chars().count() > self.min_chars)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(count: usize) -> String {
        (0..count)
            .map(|i| format!("palabra{i:04}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn default_step_is_320() {
        let config = WindowConfig::default();
        assert_eq!(config.step(), 320);
        assert_eq!(
            config.window_starts(1000).collect::<Vec<_>>(),
            vec![0, 320, 640, 960]
        );
    }

    #[test]
    fn windows_cover_expected_word_spans() {
        let config = WindowConfig::default();
        let windows = config.windows(&words(1000));
        assert_eq!(windows.len(), 4);
        assert!(windows[0].starts_with("palabra0000 "));
        assert!(windows[1].starts_with("palabra0320 "));
        assert!(windows[2].starts_with("palabra0640 "));
        assert!(windows[3].starts_with("palabra0960 "));
        assert!(windows[3].ends_with("palabra0999"));
        assert_eq!(windows[0].split(' ').count(), 400);
        assert_eq!(windows[3].split(' ').count(), 40);
    }

    #[test]
    fn short_tail_window_is_dropped() {
        // 40 words of "w" joined by spaces is 79 characters, under the threshold
        let mut text = "palabra ".repeat(960);
        text.push_str(&"w ".repeat(40));
        let windows = WindowConfig::default().windows(&text);
        assert_eq!(windows.len(), 3);
    }

    #[test]
    fn threshold_is_exclusive() {
        let config = WindowConfig::new(10, 0.0, 9).expect("config");
        // "aaaa bbbb" is exactly 9 characters and is dropped
        assert!(config.windows("aaaa bbbb").is_empty());
        assert_eq!(config.windows("aaaa bbbbb"), vec!["aaaa bbbbb".to_string()]);
    }

    #[test]
    fn short_documents_may_yield_nothing() {
        assert!(WindowConfig::default().windows("muy corto").is_empty());
        assert!(WindowConfig::default().windows("").is_empty());
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        assert!(WindowConfig::new(0, 0.2, 10).is_err());
        assert!(WindowConfig::new(10, 1.0, 10).is_err());
        assert!(WindowConfig::new(10, -0.1, 10).is_err());
        assert!(WindowConfig::new(10, f64::NAN, 10).is_err());
    }

    #[test]
    fn step_never_stalls() {
        let config = WindowConfig::new(1, 0.9, 0).expect("config");
        assert_eq!(config.step(), 1);
        assert_eq!(config.windows("a b c").len(), 3);
    }
}
