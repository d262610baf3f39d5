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

//! Component F: devices cgroup v1 authorization.
//!
//! This is the one durable, non-reversible side effect the engine makes —
//! see `transaction.rs` for why it deliberately never enters the mount
//! log's rollback path.

use nix::sys::stat::{dev_t, major, minor};

use crate::backend::Backend;
use crate::error::Error;

/// Appends `c <major>:<minor> rw` to `{dev_cg}/devices.allow`.
pub fn authorize(backend: &mut impl Backend, dev_cg: &std::path::Path, dev_id: dev_t) -> Result<(), Error> {
    let path = dev_cg.join("devices.allow");
    let line = format!("c {}:{} rw", major(dev_id), minor(dev_id));
    log::info!("whitelisting device node {}:{}", major(dev_id), minor(dev_id));
    backend.append_file(&path, &line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use nix::sys::stat::makedev;
    use std::path::Path;

    #[test]
    fn appends_the_allow_line_with_major_minor() {
        let mut b = FakeBackend::new();
        authorize(&mut b, Path::new("/sys/fs/cgroup/devices/mycontainer"), makedev(195, 0)).unwrap();
        let writes = b.cgroup_writes.borrow();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, Path::new("/sys/fs/cgroup/devices/mycontainer/devices.allow"));
        assert_eq!(writes[0].1, "c 195:0 rw");
    }

    #[test]
    fn two_devices_produce_two_independent_appends() {
        let mut b = FakeBackend::new();
        authorize(&mut b, Path::new("/cg"), makedev(195, 0)).unwrap();
        authorize(&mut b, Path::new("/cg"), makedev(195, 255)).unwrap();
        let writes = b.cgroup_writes.borrow();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].1, "c 195:255 rw");
    }
}
