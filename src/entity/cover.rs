// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Cover entity specific logic.

use crate::client::model::MoveDirection;
use crate::entity::{EntityCommand, cmd_from_str};
use crate::errors::ServiceError;
use crate::projector::ProjectedState;
use serde_json::{Map, Value};
use strum::{Display, EnumString, VariantNames};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum CoverCommand {
    Open,
    Close,
    Stop,
    Position,
}

/// Vendor API call a cover command translates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverCall {
    Direction(MoveDirection),
    Percentage(u8),
}

pub(crate) fn map_cover_attributes(projected: &ProjectedState) -> Map<String, Value> {
    let mut attributes = Map::with_capacity(2);

    if let Some(state) = projected.value.as_str() {
        attributes.insert("state".into(), state.to_uppercase().into());
    }
    if let Some(position) = projected.attributes.get("position") {
        attributes.insert("position".into(), position.clone());
    }

    attributes
}

/// Translate a cover service call 1:1 into a vendor API call.
///
/// No local state mutation occurs on command: the visible state follows the
/// subsequent poll or push update.
pub fn handle_cover(msg: &EntityCommand) -> Result<CoverCall, ServiceError> {
    let cmd: CoverCommand = cmd_from_str(&msg.cmd_id)?;

    let result = match cmd {
        CoverCommand::Open => CoverCall::Direction(MoveDirection::Up),
        CoverCommand::Close => CoverCall::Direction(MoveDirection::Down),
        CoverCommand::Stop => CoverCall::Direction(MoveDirection::Stop),
        CoverCommand::Position => {
            let position = msg
                .params
                .as_ref()
                .and_then(|params| params.get("position"))
                .and_then(|v| v.as_u64());
            match position {
                Some(position @ 0..=100) => CoverCall::Percentage(position as u8),
                _ => {
                    return Err(ServiceError::BadRequest(
                        "Missing or invalid position parameter (0..=100)".into(),
                    ));
                }
            }
        }
    };

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn command(cmd_id: &str, params: Option<Value>) -> EntityCommand {
        EntityCommand {
            entity_id: "dev1_cover_position".into(),
            cmd_id: cmd_id.into(),
            params: params.and_then(|p| p.as_object().cloned()),
        }
    }

    #[rstest]
    #[case("open", CoverCall::Direction(MoveDirection::Up))]
    #[case("close", CoverCall::Direction(MoveDirection::Down))]
    #[case("stop", CoverCall::Direction(MoveDirection::Stop))]
    fn direction_commands(#[case] cmd_id: &str, #[case] expected: CoverCall) {
        assert_eq!(Ok(expected), handle_cover(&command(cmd_id, None)));
    }

    #[test]
    fn position_command_requires_valid_percentage() {
        assert_eq!(
            Ok(CoverCall::Percentage(25)),
            handle_cover(&command("position", Some(json!({ "position": 25 }))))
        );
        assert!(handle_cover(&command("position", None)).is_err());
        assert!(handle_cover(&command("position", Some(json!({ "position": 101 })))).is_err());
    }

    #[test]
    fn unknown_command_is_rejected() {
        let result = handle_cover(&command("tilt", None));
        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    }
}
