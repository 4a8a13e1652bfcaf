use super::errors::SubmitError;

pub type SubmitResult<P> = Result<(), SubmitError<P>>;
