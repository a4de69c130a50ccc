use enroll_core::mapper::Mapper;

use crate::models::enrollment::{Enrollment, EnrollmentDto, EnrollmentPatch};

#[derive(Debug, Clone, Copy, Default)]
pub struct EnrollmentMapper;

impl Mapper<Enrollment> for EnrollmentMapper {
    type Dto = EnrollmentDto;
    type PatchDto = EnrollmentPatch;

    fn map(&self, enrollment: &Enrollment) -> EnrollmentDto {
        EnrollmentDto {
            user_id: Some(enrollment.user_id),
            course_id: Some(enrollment.course_id),
            status: Some(enrollment.status),
            grade: enrollment.grade,
            version: enrollment.version,
            created_at: enrollment.created_at,
        }
    }

    fn update(&self, dto: &EnrollmentDto, enrollment: &mut Enrollment) {
        enrollment.user_id = dto.user_id.unwrap_or_default();
        enrollment.course_id = dto.course_id.unwrap_or_default();
        enrollment.status = dto.status.unwrap_or_default();
        enrollment.grade = dto.grade;
    }

    fn patch(&self, patch: EnrollmentPatch, enrollment: &mut Enrollment) {
        patch.status.apply_required(&mut enrollment.status);
        patch.grade.apply(&mut enrollment.grade);
    }
}
