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

//! Component E: the `10-container.conf` application-profile patcher.
//!
//! The file this module manages is engine-owned: nothing but this code
//! (and, per spec, anyone hand-editing the file on the host) ever writes
//! it. Parsing is deliberately loose — a substring search for `0x` rather
//! than a JSON parser — to stay compatible with a file an operator edited
//! by hand, matching the original driver's own parser.

use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::error::{Error, ErrorKind};
use crate::model::NV_APP_PROFILE_DIR;
use crate::mount::MountClass;
use crate::respath;

const CONF_NAME: &str = "10-container.conf";
const CONF_MODE: u32 = 0o555;

fn render(mask: u64) -> String {
    format!(
        "{{\"profiles\":[{{\"name\":\"_container_\",\"settings\":[\"EGLVisibleDGPUDevices\", 0x{mask:x}]}}],\n \"rules\":[{{\"pattern\":[],\"profile\":\"_container_\"}}]}}\n"
    )
}

/// Parses the current mask out of an existing profile file's contents by
/// locating the first `0x` and reading the hex integer that follows.
fn parse_mask(buf: &[u8], path: &Path) -> Result<u64, Error> {
    let text = std::str::from_utf8(buf).map_err(|_| Error::with_path(ErrorKind::InvalidState, path))?;
    let pos = text.find("0x").ok_or_else(|| Error::with_path(ErrorKind::InvalidState, path))?;
    let digits: String = text[pos + 2..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect();
    if digits.is_empty() {
        return Err(Error::with_path(ErrorKind::InvalidState, path));
    }
    u64::from_str_radix(&digits, 16).map_err(|_| Error::with_path(ErrorKind::InvalidState, path))
}

/// Mounts a fresh tmpfs at `{rootfs}/{NV_APP_PROFILE_DIR}`. Called once per
/// `mount_driver` when `GRAPHICS_LIBS` is set; does not create the conf
/// file itself — that happens lazily the first time a GPU is admitted.
pub fn mount_tmpfs(backend: &mut impl Backend, rootfs: &Path, uid: u32, gid: u32) -> Result<PathBuf, Error> {
    let path = respath::resolve(rootfs, Path::new(NV_APP_PROFILE_DIR))?;
    backend.ensure_dir(&path, uid, gid, 0o555)?;
    log::info!("mounting tmpfs at {}", path.display());
    backend.mount_tmpfs(&path, 0o555)?;
    backend.remount(&path, MountClass::AppProfileTmpfs)?;
    Ok(path)
}

/// Admits GPU minor `minor` into the profile's device mask, creating the
/// conf file if absent or OR-ing the bit into the existing mask otherwise.
pub fn admit_minor(backend: &mut impl Backend, rootfs: &Path, minor: u32, uid: u32, gid: u32) -> Result<(), Error> {
    let path = respath::resolve(rootfs, &Path::new(NV_APP_PROFILE_DIR).join(CONF_NAME))?;
    let bit = 1u64 << minor;
    let mask = match backend.read_host_file(&path)? {
        None => bit,
        Some(existing) => parse_mask(&existing, &path)? | bit,
    };
    backend.ensure_regular(&path, render(mask).as_bytes(), uid, gid, CONF_MODE)?;
    Ok(())
}
