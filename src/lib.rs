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

//! Injects an NVIDIA GPU driver userspace — device nodes, libraries,
//! binaries, IPC sockets, and a synthesized per-driver procfs view — into
//! an already-created Linux container's mount namespace.
//!
//! This crate is the injection engine only: driver discovery (which files
//! make up the driver), container-handle construction, and option-string
//! parsing are the caller's responsibility, supplied as [`model::DriverInfo`]
//! and [`model::Container`] values. See `mount_driver` and `mount_device`.

pub mod appprofile;
pub mod backend;
pub mod cgroup;
pub mod error;
pub mod fsops;
pub mod model;
pub mod mount;
pub mod procfs;
pub mod respath;
pub mod symlink;
pub mod transaction;

pub use backend::{Backend, LinuxBackend};
pub use error::{Error, ErrorKind, Result};
pub use model::{Container, ContainerFlags, ContainerPaths, Context, Device, DeviceNode, DriverInfo, TaggedFile};
pub use transaction::{mount_device, mount_driver};
