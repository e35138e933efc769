use std::mem::size_of;

use bytes::{Buf, BufMut};

use crate::{error::Error, protocol::StatusCode};

pub trait TryBuf: Buf {
    fn try_get_u8(&mut self) -> Result<u8, Error>;
    fn try_get_u32(&mut self) -> Result<u32, Error>;
    fn try_get_u64(&mut self) -> Result<u64, Error>;
    fn try_get_i64(&mut self) -> Result<i64, Error>;
    fn try_get_bool(&mut self) -> Result<bool, Error>;
    fn try_get_array<const N: usize>(&mut self) -> Result<[u8; N], Error>;
    fn try_get_bytes(&mut self) -> Result<Vec<u8>, Error>;
    fn try_get_string(&mut self) -> Result<String, Error>;
}

fn ensure(remaining: usize, len: usize) -> Result<(), Error> {
    if remaining < len {
        return Err(Error::Protocol(StatusCode::BadMessage));
    }

    Ok(())
}

impl<T: Buf> TryBuf for T {
    fn try_get_u8(&mut self) -> Result<u8, Error> {
        ensure(self.remaining(), size_of::<u8>())?;
        Ok(self.get_u8())
    }

    fn try_get_u32(&mut self) -> Result<u32, Error> {
        ensure(self.remaining(), size_of::<u32>())?;
        Ok(self.get_u32())
    }

    fn try_get_u64(&mut self) -> Result<u64, Error> {
        ensure(self.remaining(), size_of::<u64>())?;
        Ok(self.get_u64())
    }

    fn try_get_i64(&mut self) -> Result<i64, Error> {
        ensure(self.remaining(), size_of::<i64>())?;
        Ok(self.get_i64())
    }

    fn try_get_bool(&mut self) -> Result<bool, Error> {
        match self.try_get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::BadMessage(format!("invalid bool byte {other}"))),
        }
    }

    fn try_get_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        ensure(self.remaining(), N)?;

        let mut array = [0; N];
        self.copy_to_slice(&mut array);
        Ok(array)
    }

    fn try_get_bytes(&mut self) -> Result<Vec<u8>, Error> {
        let len = self.try_get_u32()? as usize;
        ensure(self.remaining(), len)?;

        Ok(self.copy_to_bytes(len).to_vec())
    }

    fn try_get_string(&mut self) -> Result<String, Error> {
        let bytes = self.try_get_bytes()?;
        String::from_utf8(bytes).map_err(|_| Error::Protocol(StatusCode::BadMessage))
    }
}

pub trait PutBuf: BufMut {
    fn put_str(&mut self, str: &str);
    fn put_bool(&mut self, value: bool);
}

impl<T: BufMut> PutBuf for T {
    #[allow(clippy::cast_possible_truncation)]
    fn put_str(&mut self, str: &str) {
        let bytes = str.as_bytes();

        self.put_u32(bytes.len() as u32);
        self.put_slice(bytes);
    }

    fn put_bool(&mut self, value: bool) {
        self.put_u8(u8::from(value));
    }
}
