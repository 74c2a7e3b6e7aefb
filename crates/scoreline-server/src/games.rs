//! `GET /api/games/{game_id}/members`: read-only view of a game channel.

use axum::extract::{Extension, Path, State};
use axum::response::Json;
use scoreline_relay::{ChannelId, ConnectionId};
use serde::Serialize;
use tracing::debug;

use crate::auth::AuthenticatedUser;
use crate::server::AppState;

/// Members of one game channel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembersResponse {
    /// The requested game.
    pub game_id: ChannelId,
    /// Member connection IDs, sorted.
    pub members: Vec<ConnectionId>,
    /// Number of members.
    pub count: usize,
}

/// List the connections currently in a game. Unknown games are empty.
pub async fn members_handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<MembersResponse> {
    let game = ChannelId::from(game_id);
    let mut members = state.registry.directory().members_of(&game);
    members.sort();
    debug!(user_id = %user.user_id, game_id = %game, count = members.len(), "listed game members");
    Json(MembersResponse {
        count: members.len(),
        game_id: game,
        members,
    })
}
