pub use enclose::*;

#[macro_export]
macro_rules! subscribe {
    ($stream:expr, ( $($d_tt:tt)* ) $value:ident => $($b:tt)*) => {
        $stream.subscribe($crate::macros::enclose!(($( $d_tt )*) move |$value| { $($b)* }))
    };
    ($stream:expr, $value:ident => $($b:tt)*) => {
        $stream.subscribe(move |$value| { $($b)* })
    };
}
