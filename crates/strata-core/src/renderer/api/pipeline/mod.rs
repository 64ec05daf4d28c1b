// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Pipeline descriptions, fixed-function state and the derived binding layout.

mod descriptor;
mod enums;
mod layout;
mod state;

pub use self::descriptor::*;
pub use self::enums::*;
pub use self::layout::*;
pub use self::state::*;

/// Maximum number of simultaneously bound render targets.
pub const MAX_RENDER_TARGETS: usize = 8;
/// Maximum number of constant buffer slots of a pipeline.
pub const MAX_CONSTANT_BUFFERS: usize = 8;
/// Maximum number of vertex attributes of a pipeline.
pub const MAX_INPUT_LAYOUTS: usize = 8;
/// Maximum number of textures (and static samplers) bound to a pipeline.
pub const MAX_BOUND_TEXTURES: usize = 8;
