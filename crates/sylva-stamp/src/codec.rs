//! Raw kernel encoding.
//!
//! A kernel is stored as a big-endian `i32` center offset followed by
//! `internal_size²` big-endian `f32` values in row-major order. The
//! internal size is not stored; the reader supplies it from context.
//! There is no magic number or version field.

use std::io::{self, Read, Write};

use crate::error::KernelError;
use crate::kernel::InfluenceKernel;
use crate::size::SizeClass;

/// Bytes occupied by an encoded kernel of `size_class`.
pub fn encoded_len(size_class: SizeClass) -> usize {
    4 + 4 * size_class.cell_count()
}

// ── Primitives ──────────────────────────────────────────────────

fn write_i32_be(w: &mut dyn Write, v: i32) -> Result<(), KernelError> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

fn write_f32_be(w: &mut dyn Write, v: f32) -> Result<(), KernelError> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

fn word(buf: &[u8], at: usize) -> [u8; 4] {
    [buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]
}

// ── Kernels ─────────────────────────────────────────────────────

/// Write `kernel` to `w`.
pub fn write_kernel(w: &mut dyn Write, kernel: &InfluenceKernel) -> Result<(), KernelError> {
    let offset = i32::try_from(kernel.offset()).map_err(|_| KernelError::Malformed {
        detail: format!("offset {} does not fit in i32", kernel.offset()),
    })?;
    write_i32_be(w, offset)?;
    for &v in kernel.values() {
        write_f32_be(w, v)?;
    }
    Ok(())
}

/// Read one kernel of `size_class` from `r`.
///
/// Fails with [`KernelError::Truncated`] if the stream ends early and
/// [`KernelError::Malformed`] if the offset is negative or does not fit
/// the size class.
pub fn read_kernel(r: &mut dyn Read, size_class: SizeClass) -> Result<InfluenceKernel, KernelError> {
    let expected = encoded_len(size_class);
    let mut buf = vec![0u8; expected];
    r.read_exact(&mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => KernelError::Truncated { expected },
        _ => KernelError::Io(e),
    })?;

    let offset = i32::from_be_bytes(word(&buf, 0));
    let internal_size = size_class.internal_size();
    if offset < 0 || offset as usize * 2 + 1 > internal_size {
        return Err(KernelError::Malformed {
            detail: format!("offset {offset} invalid for internal size {internal_size}"),
        });
    }
    let values = (0..size_class.cell_count())
        .map(|i| f32::from_be_bytes(word(&buf, 4 + 4 * i)))
        .collect();
    InfluenceKernel::from_values(size_class, offset as usize, values)
}

/// Encode `kernel` into a fresh buffer.
pub fn encode_kernel(kernel: &InfluenceKernel) -> Result<Vec<u8>, KernelError> {
    let mut out = Vec::with_capacity(encoded_len(kernel.size_class()));
    write_kernel(&mut out, kernel)?;
    Ok(out)
}
