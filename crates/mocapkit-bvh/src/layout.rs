//! Per-node channel layout: which channels a node declares and in what order.

use crate::types::{Channel, RotationOrder};

/// The channels one node declares in the hierarchy block.
///
/// Position channels come first, then rotation channels, matching the column
/// order in the motion block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelLayout {
    position_channels: Vec<Channel>,
    rotation_channels: Vec<Channel>,
}

impl ChannelLayout {
    /// Standard layout: optional `Xposition Yposition Zposition`, then the
    /// three rotation channels of `order`.
    pub fn from_rotation_order(order: RotationOrder, has_position_channels: bool) -> Self {
        let position_channels = if has_position_channels {
            vec![Channel::Xposition, Channel::Yposition, Channel::Zposition]
        } else {
            Vec::new()
        };
        Self {
            position_channels,
            rotation_channels: order.channels().to_vec(),
        }
    }

    /// Layout from an explicit channel list (e.g. a parsed `CHANNELS` line),
    /// preserving relative order within each group.
    pub fn from_channels(channels: impl IntoIterator<Item = Channel>) -> Self {
        let (position_channels, rotation_channels) =
            channels.into_iter().partition(Channel::is_position);
        Self {
            position_channels,
            rotation_channels,
        }
    }

    /// The default layout for a node: roots carry position channels, every
    /// node carries rotations in the default order.
    pub fn default_for(is_root: bool) -> Self {
        Self::from_rotation_order(RotationOrder::DEFAULT, is_root)
    }

    /// All channels, position first, in declaration order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.position_channels
            .iter()
            .chain(&self.rotation_channels)
            .copied()
    }

    /// Number of declared channels.
    pub fn channel_count(&self) -> usize {
        self.position_channels.len() + self.rotation_channels.len()
    }

    /// True if the node declares position channels.
    pub fn has_position_channels(&self) -> bool {
        !self.position_channels.is_empty()
    }

    /// True if the node declares rotation channels.
    pub fn has_rotation_channels(&self) -> bool {
        !self.rotation_channels.is_empty()
    }

    /// The declared position channels.
    pub fn position_channels(&self) -> &[Channel] {
        &self.position_channels
    }

    /// The declared rotation channels.
    pub fn rotation_channels(&self) -> &[Channel] {
        &self.rotation_channels
    }

    /// The Euler order of the rotation channels, if they form one.
    pub fn rotation_order(&self) -> Option<RotationOrder> {
        RotationOrder::from_channels(&self.rotation_channels)
    }
}
