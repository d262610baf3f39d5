/*
 * The MIT License
 * Copyright (c) 2022 Guillem Castro
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in
 * all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
 * THE SOFTWARE.
 */

//! Component G: ABI-compatibility symlinks created next to mounted
//! libraries. Matched by basename prefix, same as `nvc_mount.c`'s
//! `symlink_libraries`.

use std::path::Path;

use crate::backend::Backend;
use crate::error::Error;

const LIBCUDA_PREFIX: &str = "libcuda.so.";
const LIBGLX_NVIDIA_PREFIX: &str = "libGLX_nvidia.so.";

/// Given the container-local path a library was just bind-mounted to,
/// create its ABI-compatibility sibling symlink, if any applies.
pub fn link_for_mounted_library(backend: &mut impl Backend, mounted: &Path, uid: u32, gid: u32) -> Result<(), Error> {
    let Some(basename) = mounted.file_name().and_then(|n| n.to_str()) else {
        return Ok(());
    };
    let Some(dir) = mounted.parent() else {
        return Ok(());
    };

    if basename.starts_with(LIBCUDA_PREFIX) {
        let link = dir.join("libcuda.so");
        log::info!("creating symlink {} -> {}", link.display(), basename);
        backend.ensure_symlink(&link, Path::new(basename), uid, gid)?;
    } else if basename.starts_with(LIBGLX_NVIDIA_PREFIX) {
        let link = dir.join("libGLX_indirect.so.0");
        log::info!("creating symlink {} -> {}", link.display(), basename);
        backend.ensure_symlink(&link, Path::new(basename), uid, gid)?;
    }
    Ok(())
}
