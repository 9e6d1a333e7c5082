pub fn assert_send_sync<T: ?Sized + Send + Sync>() {}
