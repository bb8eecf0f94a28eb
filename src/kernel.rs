//! The catalog of supported error diffusion kernels.
//!
//! Every kernel is 7 columns wide and 2 to 4 rows tall. The weights themselves live in the
//! error lookup table supplied by the caller; the catalog only describes the shape each
//! kernel occupies in that table and in the error buffers.
//!
//! The weight slots of a kernel row are laid out around the current pixel:
//! slot `s` targets the column `col + (s - 3) * step`, so slot 3 is the current column
//! and slots 4..7 lie ahead of it in scan direction.

use crate::{HalftoneError, Result};

/// The width of every kernel in weight slots.
pub const KERNEL_WIDTH: usize = 7;

/// The slot of a kernel row that lines up with the current column.
pub(crate) const KERNEL_CENTER: usize = KERNEL_WIDTH / 2;

/// The number of kernels in the catalog.
pub const NUM_KERNELS: usize = 17;

/// The shape of one error diffusion kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    /// Short descriptive name, `<variant>_<cols>x<rows>`.
    pub name: &'static str,
    /// The number of kernel rows (and error buffer rows).
    pub height: u8,
    /// The number of non-zero weights.
    pub weights: u8,
}

impl Kernel {
    /// Number of entries per intensity in the error lookup table.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.height as usize * KERNEL_WIDTH
    }
}

/// Shorthand for the catalog entries below.
const fn kernel(name: &'static str, height: u8, weights: u8) -> Kernel {
    Kernel { name, height, weights }
}

/// The kernel catalog, indexed by kernel index.
pub const KERNELS: [Kernel; NUM_KERNELS] = [
    kernel("a_3x2", 2, 3),
    kernel("b_3x2", 2, 4),
    kernel("a_2x3", 3, 5),
    kernel("a_3x3", 3, 5),
    kernel("b_3x3", 3, 7),
    kernel("a_5x2", 2, 7),
    kernel("b_5x2", 2, 7),
    kernel("c_5x2", 2, 7),
    kernel("d_5x2", 2, 6),
    kernel("a_5x3", 3, 12),
    kernel("b_5x3", 3, 12),
    kernel("c_5x3", 3, 10),
    kernel("d_5x3", 3, 10),
    kernel("e_5x3", 3, 6),
    kernel("a_7x4", 4, 18),
    kernel("b_7x4", 4, 20),
    kernel("c_3x2", 2, 4),
];

/// Looks up the kernel with the given index.
///
/// # Errors
/// Returns [`HalftoneError::InvalidKernelIndex`] if `index` is greater than 16.
pub fn kernel_info(index: u8) -> Result<&'static Kernel> {
    KERNELS
        .get(usize::from(index))
        .ok_or(HalftoneError::InvalidKernelIndex(index))
}

/// Returns the height of the kernel with the given index.
///
/// # Errors
/// Returns [`HalftoneError::InvalidKernelIndex`] if `index` is greater than 16.
pub fn kernel_height(index: u8) -> Result<u8> {
    kernel_info(index).map(|k| k.height)
}

/// Returns the number of error table entries per intensity for the given kernel,
/// i.e. `height * 7`.
///
/// # Errors
/// Returns [`HalftoneError::InvalidKernelIndex`] if `index` is greater than 16.
pub fn kernel_size(index: u8) -> Result<usize> {
    kernel_info(index).map(Kernel::size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heights_match_catalog() {
        let expected = [2, 2, 3, 3, 3, 2, 2, 2, 2, 3, 3, 3, 3, 3, 4, 4, 2];
        for (k, &height) in expected.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation)]
            let k = k as u8;
            assert_eq!(kernel_height(k), Ok(height));
            assert_eq!(kernel_size(k), Ok(usize::from(height) * 7));
        }
    }

    #[test]
    fn out_of_range() {
        for k in 17..=u8::MAX {
            assert_eq!(kernel_height(k), Err(HalftoneError::InvalidKernelIndex(k)));
        }
    }

    #[test]
    fn weights_fit_kernel() {
        for kernel in &KERNELS {
            assert!(usize::from(kernel.weights) < kernel.size());
        }
        assert_eq!(KERNELS[16].weights, 4);
        assert_eq!(KERNELS[16].size(), 14);
    }
}
