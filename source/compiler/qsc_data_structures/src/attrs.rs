// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.


use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    /// QIR attributes used during codegen.
    pub struct Attributes: u32 {
        const EntryPoint   = 0b_0001;
        const Irreversible = 0b_0010;
    }
}

impl Attributes {
    /// The attribute group number used for these attributes in emitted QIR.
    /// Only single-flag values map to a group.
    #[must_use]
    pub fn group_id(self) -> Option<u32> {
        if self == Attributes::EntryPoint {
            Some(0)
        } else if self == Attributes::Irreversible {
            Some(1)
        } else {
            None
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Attributes::empty()
    }
}
