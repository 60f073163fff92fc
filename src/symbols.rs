//! The symbol collection: greedy per-character mode selection, version
//! escalation, and structured append splitting.

use tracing::debug;

use crate::charset::ByteCharset;
use crate::error::{Error, Result};
use crate::segments;
use crate::symbol::{BuildParams, FitError, Symbol, SymbolState};
use crate::types::{ErrorCorrectionLevel, Version};

/// Maximum number of symbols a structured append sequence may hold; the
/// position and total fields of the header are four bits each.
const MAX_STRUCTURED_APPEND_SYMBOLS: usize = 16;

/// A sequence of QR symbols built from appended text.
///
/// A collection is created with its encoding parameters and grows
/// character by character through [`Symbols::append_string`]. With
/// structured append enabled, input that overflows the maximum version
/// spills into additional symbols (up to 16) that readers reassemble.
///
/// # Example
///
/// ```rust
/// use qrsymbols::Symbols;
///
/// let mut symbols = Symbols::new();
/// symbols.append_string("01234567").unwrap();
/// let symbol = symbols.get(0);
/// assert_eq!(symbol.version().value(), 1);
/// let dib = symbol.get_24bpp_dib(None, None, None).unwrap();
/// assert_eq!(&dib[..2], b"BM");
/// ```
pub struct Symbols {
    ec_level: ErrorCorrectionLevel,
    /// Lowest version a new symbol starts at. Raised whenever any symbol
    /// escalates, so later structured append symbols skip versions the
    /// data has already outgrown.
    min_version: Version,
    max_version: Version,
    structured_append_allowed: bool,
    charset: ByteCharset,
    parity: u8,
    states: Vec<SymbolState>,
}

impl Symbols {
    /// Creates a collection with the default parameters: error correction
    /// level M, versions up to 40, structured append disabled, and the
    /// ISO-8859-1 byte-mode character set.
    pub fn new() -> Self {
        Self::build(
            ErrorCorrectionLevel::Medium,
            Version::MAX,
            false,
            ByteCharset::latin1(),
        )
    }

    /// Creates a collection with explicit parameters.
    ///
    /// `max_version` must lie in 1..=40 and `byte_mode_charset` must be a
    /// recognized character set label, otherwise `InvalidArgument` is
    /// returned before anything is built.
    pub fn with_options(
        ec_level: ErrorCorrectionLevel,
        max_version: u8,
        allow_structured_append: bool,
        byte_mode_charset: &str,
    ) -> Result<Self> {
        if !(Version::MIN.value()..=Version::MAX.value()).contains(&max_version) {
            return Err(Error::InvalidArgument(format!(
                "max_version must be in 1..=40, got {}",
                max_version
            )));
        }
        let charset = ByteCharset::for_label(byte_mode_charset).ok_or_else(|| {
            Error::InvalidArgument(format!("unknown charset label {:?}", byte_mode_charset))
        })?;
        Ok(Self::build(
            ec_level,
            Version::new(max_version),
            allow_structured_append,
            charset,
        ))
    }

    fn build(
        ec_level: ErrorCorrectionLevel,
        max_version: Version,
        structured_append_allowed: bool,
        charset: ByteCharset,
    ) -> Self {
        let mut symbols = Self {
            ec_level,
            min_version: Version::MIN,
            max_version,
            structured_append_allowed,
            charset,
            parity: 0,
            states: Vec::new(),
        };
        let params = symbols.params();
        symbols.states.push(SymbolState::new(0, Version::MIN, &params));
        symbols
    }

    fn params(&self) -> BuildParams {
        BuildParams {
            ec_level: self.ec_level,
            max_version: self.max_version,
            structured_append: self.structured_append_allowed,
            charset: self.charset,
        }
    }

    /// The error correction level shared by every symbol.
    pub fn error_correction_level(&self) -> ErrorCorrectionLevel {
        self.ec_level
    }

    /// The version ceiling symbols may escalate to.
    pub fn max_version(&self) -> Version {
        self.max_version
    }

    /// The byte-mode character set.
    pub fn byte_mode_charset(&self) -> ByteCharset {
        self.charset
    }

    /// Whether overflow may spill into additional symbols.
    pub fn structured_append_allowed(&self) -> bool {
        self.structured_append_allowed
    }

    /// The running parity byte: XOR over the bytes of every appended
    /// character. Written into each symbol's structured append header.
    pub fn structured_append_parity(&self) -> u8 {
        self.parity
    }

    /// The number of symbols built so far. At least 1.
    pub fn count(&self) -> usize {
        self.states.len()
    }

    /// Returns the symbol at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= count()`.
    pub fn get(&self, index: usize) -> Symbol<'_> {
        Symbol::new(self, &self.states[index])
    }

    /// Iterates over the symbols in structured append position order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            parent: self,
            inner: self.states.iter(),
        }
    }

    /// Appends `s`, growing the current symbol and starting new ones as
    /// structured append requires.
    ///
    /// Fails with `CapacityExceeded` when the input cannot fit (maximum
    /// version reached with structured append off, or more than 16 symbols
    /// would be needed) and with `EncodingFailed` when a character has no
    /// representation in any mode. Characters appended before a failure
    /// remain in place; the collection is never left partially corrupted.
    pub fn append_string(&mut self, s: &str) -> Result<()> {
        for c in s.chars() {
            self.append_char(c)?;
        }
        Ok(())
    }

    fn append_char(&mut self, c: char) -> Result<()> {
        let params = self.params();
        loop {
            let state = self.states.last_mut().unwrap();

            let mode = match state.current_mode() {
                // A mode keeps any character it accepts, even when a fresh
                // classification would pick a more compact one.
                Some(current) if segments::mode_accepts(current, c, params.charset) => current,
                _ => segments::best_mode(c, params.charset)
                    .ok_or_else(|| Error::EncodingFailed(c, params.charset.name()))?,
            };

            if state.current_mode() != Some(mode) {
                match state.try_set_mode(mode, c, &params) {
                    Ok(()) => {}
                    Err(FitError::Unencodable) => {
                        return Err(Error::EncodingFailed(c, params.charset.name()));
                    }
                    Err(FitError::Overflow) => {
                        self.sync_min_version();
                        self.add_symbol()?;
                        continue;
                    }
                }
            }

            match state.try_append(c, &params) {
                Ok(parity_bytes) => {
                    for byte in parity_bytes {
                        self.parity ^= byte;
                    }
                    self.sync_min_version();
                    return Ok(());
                }
                Err(FitError::Unencodable) => {
                    return Err(Error::EncodingFailed(c, params.charset.name()));
                }
                Err(FitError::Overflow) => {
                    self.sync_min_version();
                    self.add_symbol()?;
                }
            }
        }
    }

    /// Escalations apply to the current symbol even when an append fails
    /// afterwards; later symbols start at the raised floor.
    fn sync_min_version(&mut self) {
        let version = self.states.last().unwrap().version();
        if version > self.min_version {
            self.min_version = version;
        }
    }

    fn add_symbol(&mut self) -> Result<()> {
        if !self.structured_append_allowed {
            return Err(Error::CapacityExceeded(format!(
                "input does not fit at version {} with structured append disabled",
                self.max_version.value()
            )));
        }
        if self.states.len() >= MAX_STRUCTURED_APPEND_SYMBOLS {
            return Err(Error::CapacityExceeded(
                "structured append limit of 16 symbols reached".into(),
            ));
        }
        if self.states.last().unwrap().is_empty() {
            // A character that overflows a fresh symbol can never fit.
            return Err(Error::CapacityExceeded(
                "character does not fit in an empty symbol".into(),
            ));
        }
        debug!(position = self.states.len(), "starting structured append symbol");
        let params = self.params();
        let position = self.states.len();
        self.states.push(SymbolState::new(position, self.min_version, &params));
        Ok(())
    }
}

impl Default for Symbols {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the symbols of a collection.
pub struct Iter<'a> {
    parent: &'a Symbols,
    inner: std::slice::Iter<'a, SymbolState>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = Symbol<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|state| Symbol::new(self.parent, state))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Symbols {
    type Item = Symbol<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
