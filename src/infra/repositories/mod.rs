mod comments;
mod likes;
mod users;

pub use comments::PgCommentRepository;
pub use likes::PgLikeRepository;
pub use users::PgUserRepository;
