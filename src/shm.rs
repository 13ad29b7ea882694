//! Anonymous shared-memory pixel canvases
//!
//! The compositor and this client exchange pixel data through a memory-backed
//! file: we create an anonymous descriptor sized to the canvas, map it
//! read/write shared, and hand the descriptor to `wl_shm` so the compositor
//! maps the same pages. Both resources are scoped: the mapping is unmapped
//! when the canvas drops, and the descriptor is closed as soon as the pool
//! has been carved out of it (the mapping stays valid without it).

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::io::FromRawFd;

use log::debug;
use memmap2::MmapMut;
use thiserror::Error;

/// ARGB8888, the only pixel format the client speaks.
pub const BYTES_PER_PIXEL: u32 = 4;

/// Errors while setting up the shared canvas. All of them are fatal; there is
/// no fallback allocation path.
#[derive(Debug, Error)]
pub enum ShmError {
    #[error("creating an anonymous buffer file for {size} B failed: {source}")]
    CreateFd { size: usize, source: io::Error },

    #[error("resizing the anonymous buffer file to {size} B failed: {source}")]
    Resize { size: usize, source: io::Error },

    #[error("mapping {size} B of shared buffer memory failed: {source}")]
    Map { size: usize, source: io::Error },
}

/// Row stride in bytes for a canvas of the given width.
pub fn stride_for(width: u32) -> u32 {
    width * BYTES_PER_PIXEL
}

/// Total byte size of a `width` x `height` ARGB8888 canvas.
pub fn size_for(width: u32, height: u32) -> usize {
    stride_for(width) as usize * height as usize
}

/// A fixed-size ARGB8888 canvas backed by an anonymous shared file.
///
/// Dimensions are set at allocation and never change.
pub struct ShmCanvas {
    map: MmapMut,
    /// Held only until the `wl_shm` pool has been created from it.
    file: Option<File>,
    width: u32,
    height: u32,
}

impl ShmCanvas {
    /// Allocate and map an anonymous shared file sized to the canvas.
    pub fn allocate(width: u32, height: u32) -> Result<Self, ShmError> {
        let size = size_for(width, height);
        let file = create_anonymous_file(size)?;
        let map = unsafe { MmapMut::map_mut(&file) }
            .map_err(|source| ShmError::Map { size, source })?;

        debug!(
            "mapped {} B of shared pixel memory ({}x{}, stride {})",
            size,
            width,
            height,
            stride_for(width)
        );

        Ok(Self {
            map,
            file: Some(file),
            width,
            height,
        })
    }

    /// Paint every byte of the canvas with one value.
    pub fn fill(&mut self, value: u8) {
        self.map.fill(value);
    }

    /// Descriptor to hand to `wl_shm::create_pool`.
    ///
    /// `None` once [`close_file`](Self::close_file) has run.
    pub fn pool_fd(&self) -> Option<BorrowedFd<'_>> {
        self.file.as_ref().map(|f| f.as_fd())
    }

    /// Close the backing descriptor. The mapping, and any buffer the
    /// compositor carved out of the pool, remains valid without it.
    pub fn close_file(&mut self) {
        self.file = None;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> u32 {
        stride_for(self.width)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }
}

fn create_anonymous_file(size: usize) -> Result<File, ShmError> {
    let name = CString::new("waypane-shm").unwrap();
    let fd = unsafe { libc::memfd_create(name.as_ptr(), libc::MFD_CLOEXEC) };
    if fd < 0 {
        return Err(ShmError::CreateFd {
            size,
            source: io::Error::last_os_error(),
        });
    }

    let file = unsafe { File::from_raw_fd(fd) };
    file.set_len(size as u64)
        .map_err(|source| ShmError::Resize { size, source })?;

    Ok(file)
}
