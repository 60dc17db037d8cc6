// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod directory;
pub mod flows;
pub mod init;
pub mod show;
pub mod sync;

pub use directory::directory_command;
pub use flows::flows_command;
pub use init::init_command;
pub use show::show_command;
pub use sync::sync_command;
