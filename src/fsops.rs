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

//! Component B: the file materializer. The four operations spec'd here
//! (`ensure_dir`, `ensure_file`, `ensure_regular`, `ensure_symlink`) are
//! exactly `Backend`'s corresponding methods; this module is the
//! component-shaped call surface the rest of the engine uses so that
//! `backend.rs` can stay scoped to "how a syscall is made" rather than
//! "what the engine needs to exist on disk".

use std::path::Path;

use crate::backend::Backend;
use crate::error::Error;

pub fn ensure_dir(backend: &mut impl Backend, path: &Path, uid: u32, gid: u32, mode: u32) -> Result<(), Error> {
    backend.ensure_dir(path, uid, gid, mode)
}

pub fn ensure_file(backend: &mut impl Backend, path: &Path, uid: u32, gid: u32, mode: u32) -> Result<(), Error> {
    backend.ensure_file(path, uid, gid, mode)
}

pub fn ensure_regular(
    backend: &mut impl Backend,
    path: &Path,
    content: &[u8],
    uid: u32,
    gid: u32,
    mode: u32,
) -> Result<(), Error> {
    backend.ensure_regular(path, content, uid, gid, mode)
}

pub fn ensure_symlink(backend: &mut impl Backend, path: &Path, target: &Path, uid: u32, gid: u32) -> Result<(), Error> {
    backend.ensure_symlink(path, target, uid, gid)
}
