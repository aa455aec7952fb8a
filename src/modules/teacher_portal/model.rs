pub use nursery_models::classes::{
    ClassStudentInfo, MarkedDatesResponse, MyClass, ParentContact, StudentWithParents,
};
