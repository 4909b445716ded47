//! The administrative commands.
//!
//! Each handler receives a ready repository, arguments whose count has
//! already been checked, and the sink to report to.

use futures::future::BoxFuture;
use futures::{FutureExt, TryStreamExt};
use tracing::debug;

use super::args::{parse_bit_index, parse_bool};
use super::{Command, Reporter};
use crate::Result;
use crate::backend::UserRepository;
use crate::permissions::MaskKind;

/// Every command, in registration order.
pub const COMMANDS: &[Command] = &[
    Command {
        name: "listusers",
        usage: "",
        description: "List every user with its id",
        required_args: 0,
        handler: list_users,
    },
    Command {
        name: "getuser",
        usage: "<username>",
        description: "Show one user and its permission masks",
        required_args: 1,
        handler: get_user,
    },
    Command {
        name: "setpermission",
        usage: "<username> <bitIndex> <true|false>",
        description: "Set or clear one permission bit",
        required_args: 3,
        handler: set_permission,
    },
    Command {
        name: "setflag",
        usage: "<username> <bitIndex> <true|false>",
        description: "Set or clear one flag bit",
        required_args: 3,
        handler: set_flag,
    },
];

fn list_users<'a>(
    repository: &'a dyn UserRepository,
    _args: &'a [String],
    sink: &'a dyn Reporter,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let mut users = repository.find_all();
        let mut count = 0usize;
        while let Some(user) = users.try_next().await? {
            sink.sub_info(&format!("[{}] UUID: {}", user.username, user.id()));
            count += 1;
        }
        sink.info(&format!("Listed {count} users"));
        Ok(())
    }
    .boxed()
}

fn get_user<'a>(
    repository: &'a dyn UserRepository,
    args: &'a [String],
    sink: &'a dyn Reporter,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let username = args[0].as_str();
        match repository.find_by_username(username).await? {
            Some(user) => sink.info(&format!(
                "[{}] UUID: {} | permissions {}",
                user.username,
                user.id(),
                user.permissions_display()
            )),
            None => sink.error(&format!("User {username} not found")),
        }
        Ok(())
    }
    .boxed()
}

fn set_permission<'a>(
    repository: &'a dyn UserRepository,
    args: &'a [String],
    sink: &'a dyn Reporter,
) -> BoxFuture<'a, Result<()>> {
    set_bit(MaskKind::Permission, repository, args, sink).boxed()
}

fn set_flag<'a>(
    repository: &'a dyn UserRepository,
    args: &'a [String],
    sink: &'a dyn Reporter,
) -> BoxFuture<'a, Result<()>> {
    set_bit(MaskKind::Flag, repository, args, sink).boxed()
}

/// Shared body of `setpermission` and `setflag`.
///
/// The user is looked up first; index and value are parsed before the record
/// is touched, so bad input never reaches `update`.
async fn set_bit(
    kind: MaskKind,
    repository: &dyn UserRepository,
    args: &[String],
    sink: &dyn Reporter,
) -> Result<()> {
    let username = args[0].as_str();
    let Some(mut user) = repository.find_by_username(username).await? else {
        sink.error(&format!("User {username} not found"));
        return Ok(());
    };

    let index = parse_bit_index(kind, &args[1])?;
    let value = parse_bool(&args[2])?;

    let mut model = user.permissions.unwrap_or_default();
    let mask = model.set(kind, index, value)?;
    user.permissions = Some(model);
    repository.update(&user).await?;

    debug!(user = %user.username, %kind, index, value, mask, "Updated mask");
    let label = match kind {
        MaskKind::Permission => "Permission",
        MaskKind::Flag => "Flag",
    };
    sink.info(&format!("{label} {index} of {username} set to {value}"));
    Ok(())
}
