use enroll_core::mapper::{Mapper, NoPatch};

use crate::models::category::{Category, CategoryDto};

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryMapper;

impl Mapper<Category> for CategoryMapper {
    type Dto = CategoryDto;
    type PatchDto = NoPatch;

    fn map(&self, category: &Category) -> CategoryDto {
        CategoryDto {
            code: Some(category.code.clone()),
            name: Some(category.name.clone()),
            version: category.version,
        }
    }

    fn update(&self, dto: &CategoryDto, category: &mut Category) {
        category.code = dto.code.clone().unwrap_or_default();
        category.name = dto.name.clone().unwrap_or_default();
    }

    fn patch(&self, patch: NoPatch, _category: &mut Category) {
        match patch {}
    }
}
