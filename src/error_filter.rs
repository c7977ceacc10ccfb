use std::error::Error;
use tracing::warn;

pub const DEFAULT_KEYWORDS: &[&str] = &["analytics"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Suppress,
    Propagate,
}

/// Last-chance filter for errors that escaped every hook. Anything that
/// mentions one of the keywords is treated as analytics noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorFilter {
    keywords: Vec<String>,
}

impl Default for ErrorFilter {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl ErrorFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn disposition(&self, message: &str) -> Disposition {
        let message = message.to_lowercase();
        if self.keywords.iter().any(|k| message.contains(k.as_str())) {
            Disposition::Suppress
        } else {
            Disposition::Propagate
        }
    }

    /// Looks at the whole `source()` chain, not just the outer message
    pub fn disposition_of(&self, err: &(dyn Error + 'static)) -> Disposition {
        let mut current = Some(err);
        while let Some(e) = current {
            if self.disposition(&e.to_string()) == Disposition::Suppress {
                return Disposition::Suppress;
            }
            current = e.source();
        }
        Disposition::Propagate
    }

    /// `Ok` when the error was analytics noise and has been logged
    pub fn filter(&self, err: Box<dyn Error>) -> Result<(), Box<dyn Error>> {
        match self.disposition_of(&*err) {
            Disposition::Suppress => {
                warn!(error = %err, "suppressed analytics error");
                Ok(())
            }
            Disposition::Propagate => Err(err),
        }
    }
}
