//! Collaborator interfaces
//!
//! The heavy engines (PDF text layer and rasterizer, OCR, the interactive
//! password prompt) sit behind these traits so the extractor, builder and
//! dispatcher can run against fakes in tests.

use docshift_core::ConversionError;
use image::DynamicImage;
use thiserror::Error;

/// Render scale used for OCR and layout-preserving output
pub const RENDER_SCALE: f32 = 2.0;

/// Why a PDF could not be opened
#[derive(Error, Debug)]
pub enum PdfOpenError {
    /// The document is encrypted and the supplied password (if any) was rejected
    #[error("PDF requires a password")]
    PasswordRequired,

    /// The document is not a readable PDF
    #[error("Invalid PDF: {0}")]
    Invalid(String),

    /// The engine itself could not be loaded
    #[error("PDF engine unavailable: {0}")]
    Engine(String),
}

/// Pages of an opened PDF document
pub trait PdfPages {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Embedded text layer of a page (0-based index)
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist or its text cannot be read.
    fn page_text(&self, index: usize) -> Result<String, ConversionError>;

    /// Rasterize a page at `scale` times its natural size
    ///
    /// # Errors
    ///
    /// Returns an error if the page does not exist or rendering fails.
    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, ConversionError>;
}

/// PDF rendering and text-layer engine
pub trait PdfEngine {
    /// Open a PDF from memory
    ///
    /// # Errors
    ///
    /// Returns [`PdfOpenError::PasswordRequired`] for encrypted documents
    /// without a valid password, [`PdfOpenError::Invalid`] for unreadable
    /// input and [`PdfOpenError::Engine`] when the engine cannot be loaded.
    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<Box<dyn PdfPages + 'a>, PdfOpenError>;
}

/// Optical character recognition engine
pub trait OcrEngine {
    /// Recognize the text in a rendered page
    ///
    /// # Errors
    ///
    /// Returns an error if recognition fails.
    fn recognize(&self, image: &DynamicImage) -> Result<String, ConversionError>;
}

/// Why a password is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordReason {
    /// First request for this document
    Required,
    /// The previous entry was rejected
    Incorrect,
}

/// Interactive source of PDF passwords
pub trait PasswordPrompt {
    /// Ask for a password; `None` cancels
    fn request_password(&self, reason: PasswordReason) -> Option<String>;
}

/// Prompt that always cancels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NoPassword;

impl PasswordPrompt for NoPassword {
    #[inline]
    fn request_password(&self, _reason: PasswordReason) -> Option<String> {
        None
    }
}

/// Prompt that answers with a fixed password once, then cancels
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixedPassword {
    password: String,
}

impl FixedPassword {
    /// Create a prompt answering with `password`
    #[must_use = "creates a password prompt"]
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

impl PasswordPrompt for FixedPassword {
    fn request_password(&self, reason: PasswordReason) -> Option<String> {
        match reason {
            PasswordReason::Required => Some(self.password.clone()),
            PasswordReason::Incorrect => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory engines for unit tests

    use super::*;
    use std::cell::{Cell, RefCell};

    /// PDF whose pages are plain strings, optionally password protected
    pub struct FakePdf {
        pub pages: Vec<String>,
        pub password: Option<String>,
        pub page_size: (u32, u32),
    }

    impl FakePdf {
        pub fn new(pages: &[&str]) -> Self {
            Self {
                pages: pages.iter().map(ToString::to_string).collect(),
                password: None,
                page_size: (612, 792),
            }
        }

        pub fn with_password(mut self, password: &str) -> Self {
            self.password = Some(password.to_string());
            self
        }
    }

    struct FakePages<'a> {
        pages: &'a [String],
        page_size: (u32, u32),
    }

    impl PdfPages for FakePages<'_> {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize) -> Result<String, ConversionError> {
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| ConversionError::EngineError(format!("no page {index}")))
        }

        fn render_page(&self, _index: usize, scale: f32) -> Result<DynamicImage, ConversionError> {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let (w, h) = (
                (self.page_size.0 as f32 * scale) as u32,
                (self.page_size.1 as f32 * scale) as u32,
            );
            Ok(DynamicImage::new_rgb8(w, h))
        }
    }

    impl PdfEngine for FakePdf {
        fn open<'a>(
            &'a self,
            _bytes: &'a [u8],
            password: Option<&'a str>,
        ) -> Result<Box<dyn PdfPages + 'a>, PdfOpenError> {
            if self.password.is_some() && self.password.as_deref() != password {
                return Err(PdfOpenError::PasswordRequired);
            }
            Ok(Box::new(FakePages {
                pages: &self.pages,
                page_size: self.page_size,
            }))
        }
    }

    /// Engine that rejects every document
    pub struct BrokenPdf(pub fn() -> PdfOpenError);

    impl PdfEngine for BrokenPdf {
        fn open<'a>(
            &'a self,
            _bytes: &'a [u8],
            _password: Option<&'a str>,
        ) -> Result<Box<dyn PdfPages + 'a>, PdfOpenError> {
            Err((self.0)())
        }
    }

    /// OCR returning a fixed result and counting calls
    pub struct FakeOcr {
        pub result: Result<String, String>,
        pub calls: Cell<usize>,
    }

    impl FakeOcr {
        pub fn returning(text: &str) -> Self {
            Self {
                result: Ok(text.to_string()),
                calls: Cell::new(0),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                result: Err(message.to_string()),
                calls: Cell::new(0),
            }
        }
    }

    impl OcrEngine for FakeOcr {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, ConversionError> {
            self.calls.set(self.calls.get() + 1);
            self.result.clone().map_err(ConversionError::EngineError)
        }
    }

    /// Prompt answering from a script and recording the reasons asked
    pub struct ScriptedPrompt {
        answers: RefCell<Vec<Option<String>>>,
        pub reasons: RefCell<Vec<PasswordReason>>,
    }

    impl ScriptedPrompt {
        pub fn new(answers: &[Option<&str>]) -> Self {
            Self {
                answers: RefCell::new(
                    answers.iter().rev().map(|a| a.map(ToString::to_string)).collect(),
                ),
                reasons: RefCell::new(Vec::new()),
            }
        }
    }

    impl PasswordPrompt for ScriptedPrompt {
        fn request_password(&self, reason: PasswordReason) -> Option<String> {
            self.reasons.borrow_mut().push(reason);
            self.answers.borrow_mut().pop().flatten()
        }
    }
}
