// SPDX-FileCopyrightText: 2023 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

/// Creates a enum of combined gender-race model codes. For example, (Hyur, Male, Midlander) becomes a new variant called HyurMidlanderMale with the discriminant 101.
#[macro_export]
macro_rules! define_gender_race_enum {
    (
        pub enum $name:ident {
            $(
                [$id:literal]($race:ident, $gender:ident $(, $subrace:ident)?)
            ),+$(,)?
        }
    ) => {
        ::paste::paste! {
            /// A model code combining gender and race, as seen in paths like `c0101`.
            #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
            #[repr(u16)]
            pub enum $name {
                $(
                    [<$race $($subrace)? $gender>] = $id,
                )+
            }

            impl $name {
                /// Every code, in ascending order.
                pub const ALL: &'static [$name] = &[
                    $($name::[<$race $($subrace)? $gender>],)+
                ];

                /// The raw code, such as `101`.
                pub fn id(self) -> u16 {
                    self as u16
                }
            }
        }
    };
}
