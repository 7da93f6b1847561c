// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

//! Generated protobuf types for the manifest wire format. See
//! `proto/space_format.proto` for the source of truth.

#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/vspace.format.pb.rs"));
