//! The current-image state a front end drives: load a file, then search it.

use crate::format::{FindResult, ImageInfo};
use crate::image::{ElfImage, LoadOptions};
use crate::{Address, ExeError, Executable};

/// Holds the most recently loaded image.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<ElfImage>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `contents` as the current image.
    ///
    /// On failure the previously loaded image, if any, stays current.
    pub fn load(&mut self, contents: Vec<u8>, options: &LoadOptions) -> Result<&ElfImage, ExeError> {
        let image = ElfImage::load(contents, options)?;
        if let Some(advisory) = image.advisory() {
            log::warn!("{}", advisory);
        }
        Ok(&*self.current.insert(image))
    }

    pub fn current(&self) -> Option<&ElfImage> {
        self.current.as_ref()
    }

    fn image(&self) -> Result<&ElfImage, ExeError> {
        self.current.as_ref().ok_or(ExeError::NoImageLoaded)
    }

    /// First virtual address of `gadget` in the current image.
    pub fn find(&self, gadget: &str) -> Result<Address, ExeError> {
        self.image()?.find(gadget)
    }

    /// Search the current image and package the outcome for output.
    ///
    /// A miss is a normal result here; only a missing image or malformed
    /// gadget text is an error.
    pub fn search(&self, gadget: &str, all: bool) -> Result<FindResult, ExeError> {
        let image = self.image()?;
        let found = if all {
            image.find_all(gadget)
        } else {
            image.find(gadget).map(|addr| vec![addr])
        };
        match found {
            Ok(addresses) => Ok(FindResult::new(gadget, addresses)),
            Err(ExeError::NotFound) => Ok(FindResult::new(gadget, Vec::new())),
            Err(e) => Err(e),
        }
    }

    /// Identity metadata of the current image.
    pub fn info(&self) -> Result<ImageInfo, ExeError> {
        Ok(ImageInfo::from_image(self.image()?))
    }
}
