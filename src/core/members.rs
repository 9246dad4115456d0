use crate::db::db_utils::is_unique_violation;
use crate::db::log::audit;
use crate::db::members::{find_by_code, insert_member, list_members};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::member::Member;

#[derive(Debug, Clone, Default)]
pub struct NewMember {
    pub code: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_visitor: bool,
}

pub struct MemberLogic;

impl MemberLogic {
    pub fn add(pool: &mut DbPool, new: &NewMember) -> AppResult<Member> {
        let code = new.code.trim();
        let name = new.full_name.trim();
        if code.is_empty() || name.is_empty() {
            return Err(AppError::InvalidValue(
                "Member code and name cannot be empty".into(),
            ));
        }

        let inserted = insert_member(
            &pool.conn,
            code,
            name,
            new.email.as_deref(),
            new.phone.as_deref(),
            new.is_visitor,
        );
        match inserted {
            Err(AppError::Db(e)) if is_unique_violation(&e) => {
                return Err(AppError::InvalidValue(format!(
                    "A member with code {code} already exists"
                )));
            }
            other => other?,
        };

        audit(&pool.conn, "member_add", code, name)?;
        find_by_code(&pool.conn, code)?.ok_or_else(|| AppError::MemberNotFound(code.into()))
    }

    pub fn list(pool: &DbPool) -> AppResult<Vec<Member>> {
        list_members(&pool.conn)
    }
}
