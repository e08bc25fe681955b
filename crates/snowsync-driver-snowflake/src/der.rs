//! Minimal DER reading and writing for RSA key material

const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_SEQUENCE: u8 = 0x30;

/// `AlgorithmIdentifier { rsaEncryption, NULL }`
const RSA_ALGORITHM_IDENTIFIER: &[u8] = &[
    0x30, 0x0d, 0x06, 0x09, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01, 0x05, 0x00,
];

/// Splits one TLV off the front of `input`: `(tag, value, rest)`
fn read_tlv(input: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&tag, input) = input.split_first()?;
    let (&first, mut input) = input.split_first()?;

    let len = if first < 0x80 {
        usize::from(first)
    } else {
        let octets = usize::from(first & 0x7f);
        if octets == 0 || octets > 4 || input.len() < octets {
            return None;
        }
        let (len_bytes, rest) = input.split_at(octets);
        input = rest;
        len_bytes
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b))
    };

    if input.len() < len {
        return None;
    }
    let (value, rest) = input.split_at(len);
    Some((tag, value, rest))
}

fn expect(input: &[u8], tag: u8) -> Option<(&[u8], &[u8])> {
    match read_tlv(input)? {
        (found, value, rest) if found == tag => Some((value, rest)),
        _ => None,
    }
}

/// Bit length of the modulus of an RSA private key, given either a PKCS#8
/// `PrivateKeyInfo` or a PKCS#1 `RSAPrivateKey`
pub(crate) fn rsa_modulus_bits(der: &[u8], pkcs8: bool) -> Option<usize> {
    let rsa_key = if pkcs8 {
        let (info, _) = expect(der, TAG_SEQUENCE)?;
        let (_, rest) = expect(info, TAG_INTEGER)?;
        let (_, rest) = expect(rest, TAG_SEQUENCE)?;
        let (octets, _) = expect(rest, TAG_OCTET_STRING)?;
        octets
    } else {
        der
    };

    let (key, _) = expect(rsa_key, TAG_SEQUENCE)?;
    let (_, rest) = expect(key, TAG_INTEGER)?;
    let (modulus, _) = expect(rest, TAG_INTEGER)?;

    let significant: &[u8] = match modulus.iter().position(|&b| b != 0) {
        Some(first) => &modulus[first..],
        None => return Some(0),
    };
    let leading = significant[0].leading_zeros() as usize;
    Some(significant.len() * 8 - leading)
}

fn write_tlv(tag: u8, value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len() + 6);
    out.push(tag);
    let len = value.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        out.push(0x80 | (bytes.len() - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
    out.extend_from_slice(value);
    out
}

/// Wraps a PKCS#1 `RSAPublicKey` into an X.509 `SubjectPublicKeyInfo`
pub(crate) fn rsa_subject_public_key_info(rsa_public_key: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(rsa_public_key.len() + 1);
    bits.push(0x00);
    bits.extend_from_slice(rsa_public_key);

    let mut body = RSA_ALGORITHM_IDENTIFIER.to_vec();
    body.extend(write_tlv(TAG_BIT_STRING, &bits));
    write_tlv(TAG_SEQUENCE, &body)
}
