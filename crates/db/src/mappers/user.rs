use enroll_core::mapper::Mapper;

use crate::models::user::{User, UserDto, UserPatch};

#[derive(Debug, Clone, Copy, Default)]
pub struct UserMapper;

impl Mapper<User> for UserMapper {
    type Dto = UserDto;
    type PatchDto = UserPatch;

    fn map(&self, user: &User) -> UserDto {
        UserDto {
            id: user.id,
            external_id: Some(user.external_id.clone()),
            name: Some(user.name.clone()),
            email: user.email.clone(),
            version: user.version,
            created_at: user.audit.created_at,
            modified_at: user.audit.modified_at,
        }
    }

    fn update(&self, dto: &UserDto, user: &mut User) {
        user.external_id = dto.external_id.clone().unwrap_or_default();
        user.name = dto.name.clone().unwrap_or_default();
        user.email = dto.email.clone();
    }

    fn patch(&self, patch: UserPatch, user: &mut User) {
        patch.name.apply_required(&mut user.name);
        patch.email.apply(&mut user.email);
    }
}
