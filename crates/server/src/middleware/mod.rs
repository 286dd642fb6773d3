mod auth;
mod model_loaders;

pub use auth::auth_middleware;
pub use model_loaders::{
    load_board_middleware, load_card_middleware, load_comment_middleware, load_list_middleware,
};
