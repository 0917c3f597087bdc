/// Implements the standard operator traits for single-field tuple structs by delegating to the
/// inner type. The operator trait must be in scope at the call site.
#[macro_export]
macro_rules! op {
    (binary $t:ty, $op:ident, $method:ident) => {
        impl $op for $t {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                Self(self.0.$method(rhs.0))
            }
        }
    };

    (inplace $t:ty, $op:ident, $method:ident) => {
        impl $op for $t {
            fn $method(&mut self, rhs: Self) {
                self.0.$method(rhs.0);
            }
        }
    };

    (unary $t:ty, $op:ident, $method:ident) => {
        impl $op for $t {
            type Output = Self;

            fn $method(self) -> Self::Output {
                Self(self.0.$method())
            }
        }
    };
}
