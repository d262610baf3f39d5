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

//! Component A: joins a container rootfs with a host-relative path,
//! rejecting any result that would escape the rootfs.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, ErrorKind};

/// Linux's `PATH_MAX`. The original C implementation bounds its path
/// buffer to this; we enforce the same bound on the resolved string.
const PATH_MAX: usize = 4096;

/// Normalizes `sub` (which may be absolute or relative, and may contain
/// `.`/`..`/repeated separators) against `rootfs`, and asserts the result
/// stays inside `rootfs`.
pub fn resolve(rootfs: &Path, sub: &Path) -> Result<PathBuf, Error> {
    let mut resolved = rootfs.to_path_buf();
    for component in sub.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::RootDir | Component::Prefix(_) => {
                // An absolute `sub` is interpreted relative to rootfs, same
                // as the original `path_resolve`'s use of `path_append`.
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(Error::with_path(ErrorKind::InvalidPath, sub));
                }
            }
        }
    }

    if !is_inside(rootfs, &resolved) {
        return Err(Error::with_path(ErrorKind::InvalidPath, sub));
    }
    let s = resolved.as_os_str();
    if s.len() > PATH_MAX {
        return Err(Error::with_path(ErrorKind::InvalidPath, sub));
    }
    Ok(resolved)
}

fn is_inside(rootfs: &Path, candidate: &Path) -> bool {
    candidate.starts_with(rootfs)
}
