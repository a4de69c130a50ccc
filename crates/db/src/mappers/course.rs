use enroll_core::mapper::Mapper;

use crate::models::course::{Course, CourseDto, CoursePatch};

#[derive(Debug, Clone, Copy, Default)]
pub struct CourseMapper;

impl Mapper<Course> for CourseMapper {
    type Dto = CourseDto;
    type PatchDto = CoursePatch;

    fn map(&self, course: &Course) -> CourseDto {
        CourseDto {
            id: course.id,
            title: Some(course.title.clone()),
            description: course.description.clone(),
            category_code: course.category_code.clone(),
            max_enrollments: Some(course.max_enrollments),
            version: course.version,
            created_at: course.audit.created_at,
            modified_at: course.audit.modified_at,
        }
    }

    fn update(&self, dto: &CourseDto, course: &mut Course) {
        course.title = dto.title.clone().unwrap_or_default();
        course.description = dto.description.clone();
        course.category_code = dto.category_code.clone();
        course.max_enrollments = dto.max_enrollments.unwrap_or_default();
    }

    fn patch(&self, patch: CoursePatch, course: &mut Course) {
        patch.title.apply_required(&mut course.title);
        patch.description.apply(&mut course.description);
        patch.category_code.apply(&mut course.category_code);
        patch.max_enrollments.apply_required(&mut course.max_enrollments);
    }
}
