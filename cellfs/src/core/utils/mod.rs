// SPDX-License-Identifier: MIT

pub mod bitmap;
pub mod time_utils;
pub mod volume;
