mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod course;
pub use course::{Course, CourseCreate, CourseWithLessonsRow};

mod lesson;
pub use lesson::{Lesson, LessonCreate};

mod subscription;
pub use subscription::{Subscription, SubscriptionCreate};
